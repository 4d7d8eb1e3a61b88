//! 全局规则配置管理

use std::path::{Path, PathBuf};
use std::time::Duration;

/// 默认远程规则源（Wappalyzer technologies.json）
pub const DEFAULT_REMOTE_URL: &str =
    "https://raw.githubusercontent.com/AliasIO/wappalyzer/master/src/technologies.json";

/// 缓存文件名
const CACHE_FILE_NAME: &str = "technologies.json";

/// 规则来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOrigin {
    LocalFile(PathBuf), // 本地规则文件
    Inline(String),     // 内存中的 JSON 文本
    Remote(String),     // 远程 URL（需 remote-loader 特性）
}

/// 覆盖规则来源（在主规则之后合并，同名技术整体覆盖）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlaySource {
    File(PathBuf),
    Inline(String),
}

impl OverlaySource {
    /// 已存在的文件路径按文件处理，否则视为 JSON 文本
    pub fn detect(value: &str) -> Self {
        let path = Path::new(value);
        if path.is_file() {
            OverlaySource::File(path.to_path_buf())
        } else {
            OverlaySource::Inline(value.to_string())
        }
    }
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    Never,     // 不重试
    Times(u8), // 固定次数重试（不含第一次）
}

impl RetryPolicy {
    pub fn max_retries(&self) -> usize {
        match self {
            RetryPolicy::Never => 0,
            RetryPolicy::Times(n) => *n as usize,
        }
    }
}

/// 网络加载相关选项
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub timeout: Duration,  // HTTP 超时
    pub retry: RetryPolicy, // 重试策略
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::Times(2),
        }
    }
}

/// 核心规则选项
#[derive(Debug, Clone)]
pub struct RuleOptions {
    /// 编译结果缓存文件
    pub cache_path: PathBuf,
    /// 忽略已有缓存，强制重新构建
    pub refresh: bool,
    /// 丢弃编译失败的技术（整条丢弃），而不是整体失败
    pub skip_invalid: bool,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            refresh: false,
            skip_invalid: false,
        }
    }
}

/// 默认缓存路径：`~/.rstechscan/technologies.json`，无 HOME 时使用 `.cache/rstechscan/`
pub fn default_cache_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty());
    match home {
        Some(home) => PathBuf::from(home).join(".rstechscan").join(CACHE_FILE_NAME),
        None => PathBuf::from(".cache/rstechscan").join(CACHE_FILE_NAME),
    }
}

/// 完整规则配置
#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub origin: RuleOrigin,
    pub overlay: Option<OverlaySource>,
    pub options: RuleOptions,
    pub remote_options: RemoteOptions,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            origin: RuleOrigin::Remote(DEFAULT_REMOTE_URL.to_string()),
            overlay: None,
            options: RuleOptions::default(),
            remote_options: RemoteOptions::default(),
        }
    }
}

impl RuleConfig {
    /// 本地规则文件
    pub fn local_file(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: RuleOrigin::LocalFile(path.into()),
            ..Self::default()
        }
    }

    /// 内存中的规则 JSON
    pub fn inline(json: impl Into<String>) -> Self {
        Self {
            origin: RuleOrigin::Inline(json.into()),
            ..Self::default()
        }
    }

    /// 远程规则源
    pub fn remote(url: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            origin: RuleOrigin::Remote(url.into()),
            remote_options: RemoteOptions { timeout, retry },
            ..Self::default()
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.options.cache_path
    }
}

/// 自定义构建器（链式 API）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: RuleConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn origin(mut self, origin: RuleOrigin) -> Self {
        self.config.origin = origin;
        self
    }

    pub fn overlay(mut self, overlay: OverlaySource) -> Self {
        self.config.overlay = Some(overlay);
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.options.cache_path = path.into();
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.config.options.refresh = refresh;
        self
    }

    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.config.options.skip_invalid = skip;
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.remote_options.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.remote_options.retry = retry;
        self
    }

    pub fn build(self) -> RuleConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = CustomConfigBuilder::new()
            .origin(RuleOrigin::LocalFile(PathBuf::from("rules.json")))
            .overlay(OverlaySource::Inline("{}".to_string()))
            .cache_path("/tmp/rstechscan-cache.json")
            .refresh(true)
            .skip_invalid(true)
            .http_timeout(Duration::from_secs(5))
            .retry(RetryPolicy::Never)
            .build();

        assert_eq!(config.origin, RuleOrigin::LocalFile(PathBuf::from("rules.json")));
        assert!(config.options.refresh);
        assert!(config.options.skip_invalid);
        assert_eq!(config.cache_path(), Path::new("/tmp/rstechscan-cache.json"));
        assert_eq!(config.remote_options.timeout, Duration::from_secs(5));
        assert_eq!(config.remote_options.retry.max_retries(), 0);
    }

    #[test]
    fn test_defaults() {
        let config = RuleConfig::default();
        assert_eq!(config.origin, RuleOrigin::Remote(DEFAULT_REMOTE_URL.to_string()));
        assert!(!config.options.refresh);
        assert!(!config.options.skip_invalid);
        assert!(config.cache_path().ends_with("technologies.json"));
    }

    #[test]
    fn test_overlay_detect_falls_back_to_inline() {
        let overlay = OverlaySource::detect(r#"{"technologies": {}}"#);
        assert_eq!(overlay, OverlaySource::Inline(r#"{"technologies": {}}"#.to_string()));
    }
}
