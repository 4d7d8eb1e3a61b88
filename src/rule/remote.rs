//! 远程规则拉取
//! 异步实现，按 RetryPolicy 重试，仅在 remote-loader 特性下可用

#[cfg(feature = "remote-loader")]
use reqwest::Client;

use crate::config::RemoteOptions;
use crate::error::{ScanError, ScanResult};

#[cfg(feature = "remote-loader")]
const USER_AGENT: &str = concat!("rstechscan/", env!("CARGO_PKG_VERSION"));

/// 远程规则拉取器
#[derive(Debug, Default, Clone)]
pub struct RemoteRuleFetcher;

impl RemoteRuleFetcher {
    /// 通用异步重试：首次执行 + 最多 max_retries 次重试，返回最后一次错误
    #[cfg(feature = "remote-loader")]
    async fn simple_retry<F, Fut, T>(&self, max_retries: usize, mut func: F) -> ScanResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ScanResult<T>>,
    {
        let mut last_err: Option<ScanError> = None;

        for attempt in 0..=max_retries {
            match func().await {
                Ok(res) => return Ok(res),
                Err(e) => {
                    last_err = Some(e);
                    if attempt < max_retries {
                        tracing::warn!("请求失败，准备重试（{}/{}）", attempt + 1, max_retries);
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScanError::RuleLoadError("重试次数已耗尽".to_string())))
    }

    /// 拉取远程规则文档原文
    #[cfg(feature = "remote-loader")]
    pub async fn fetch(&self, url: &str, options: &RemoteOptions) -> ScanResult<Vec<u8>> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let body = self
            .simple_retry(options.retry.max_retries(), || {
                let client = client.clone();
                let url = url.to_string();
                async move {
                    let response = client.get(&url).send().await?;
                    if !response.status().is_success() {
                        return Err(ScanError::RuleLoadError(format!(
                            "远程规则 {} 返回状态码 {}",
                            url,
                            response.status()
                        )));
                    }
                    Ok(response.bytes().await?.to_vec())
                }
            })
            .await?;

        tracing::info!("远程规则拉取完成：{}（{} 字节）", url, body.len());
        Ok(body)
    }

    #[cfg(not(feature = "remote-loader"))]
    pub async fn fetch(&self, url: &str, _options: &RemoteOptions) -> ScanResult<Vec<u8>> {
        Err(ScanError::FeatureDisabled(format!(
            "remote-loader 特性未启用，无法拉取 {}",
            url
        )))
    }
}
