//! rstechscan 命令行：构建规则缓存、扫描页面快照
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use rstechscan::{
    CustomConfigBuilder, JsValue, OverlaySource, PageSnapshot, RuleConfig, RuleLoader, RuleOrigin,
    SnapshotBuilder, StaticGlobals, TechDetector, TechReport, DEFAULT_REMOTE_URL,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// 规则来源参数
#[derive(clap::Args, Clone)]
struct RuleArgs {
    /// 本地规则文件（technologies.json）
    #[arg(long, conflicts_with = "url")]
    rules: Option<PathBuf>,
    /// 远程规则 URL
    #[arg(long)]
    url: Option<String>,
    /// 覆盖规则：文件路径或 JSON 文本
    #[arg(long)]
    ours: Option<String>,
    /// 编译结果缓存文件
    #[arg(long)]
    cache: Option<PathBuf>,
    /// 丢弃编译失败的技术
    #[arg(long)]
    skip_invalid: bool,
    /// 远程拉取超时（秒）
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl RuleArgs {
    fn config(&self, refresh: bool) -> RuleConfig {
        let origin = match (&self.rules, &self.url) {
            (Some(path), _) => RuleOrigin::LocalFile(path.clone()),
            (None, Some(url)) => RuleOrigin::Remote(url.clone()),
            (None, None) => RuleOrigin::Remote(DEFAULT_REMOTE_URL.to_string()),
        };
        let mut builder = CustomConfigBuilder::new()
            .origin(origin)
            .refresh(refresh)
            .skip_invalid(self.skip_invalid)
            .http_timeout(Duration::from_secs(self.timeout));
        if let Some(ours) = &self.ours {
            builder = builder.overlay(OverlaySource::detect(ours));
        }
        if let Some(cache) = &self.cache {
            builder = builder.cache_path(cache.clone());
        }
        builder.build()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// 构建规则库并写入缓存
    Update {
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// 扫描页面并输出排序后的检测结果（JSON）
    Scan {
        #[command(flatten)]
        rules: RuleArgs,
        /// 忽略缓存，重新构建规则库
        #[arg(long)]
        refresh: bool,
        /// PageSnapshot JSON 文件
        #[arg(long, conflicts_with_all = ["page_url", "html", "headers"])]
        snapshot: Option<PathBuf>,
        /// 页面 URL
        #[arg(long = "page-url")]
        page_url: Option<String>,
        /// 响应体文件
        #[arg(long)]
        html: Option<PathBuf>,
        /// 原始响应头文件（每行 `Name: value`）
        #[arg(long)]
        headers: Option<PathBuf>,
        /// js 全局变量 JSON 文件（点号路径 → 取值）
        #[arg(long)]
        globals: Option<PathBuf>,
        /// 格式化输出
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Update { rules } => {
            let config = rules.config(true);
            let db = RuleLoader::new().load(&config).await?;
            tracing::info!("规则缓存已更新：{} 条技术 → {}", db.len(), config.cache_path().display());
        }
        Commands::Scan {
            rules,
            refresh,
            snapshot,
            page_url,
            html,
            headers,
            globals,
            pretty,
        } => {
            let detector = TechDetector::new(rules.config(refresh)).await?;
            let snapshot = match snapshot {
                Some(path) => read_snapshot(&path)?,
                None => {
                    let Some(url) = page_url else {
                        bail!("需要 --snapshot 或 --page-url");
                    };
                    build_snapshot(&detector, &url, html, headers, globals).await?
                }
            };

            let reports: Vec<TechReport> = detector
                .analyze(&snapshot)
                .iter()
                .map(|r| r.to_report())
                .collect();
            let output = if pretty {
                serde_json::to_string_pretty(&reports)?
            } else {
                serde_json::to_string(&reports)?
            };
            println!("{}", output);
        }
    }
    Ok(())
}

fn read_snapshot(path: &Path) -> Result<PageSnapshot> {
    let data = fs::read(path).with_context(|| format!("读取快照文件 {} 失败", path.display()))?;
    Ok(serde_json::from_slice(&data)?)
}

async fn build_snapshot(
    detector: &TechDetector,
    url: &str,
    html: Option<PathBuf>,
    headers: Option<PathBuf>,
    globals: Option<PathBuf>,
) -> Result<PageSnapshot> {
    let mut builder = SnapshotBuilder::new(url)?;
    if let Some(path) = headers {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("读取响应头文件 {} 失败", path.display()))?;
        builder = builder.headers(&parse_raw_headers(&raw)?);
    }
    if let Some(path) = html {
        let body = fs::read(&path).with_context(|| format!("读取响应体文件 {} 失败", path.display()))?;
        builder = builder.html(String::from_utf8_lossy(&body).into_owned());
    }
    if let Some(path) = globals {
        let data = fs::read(&path).with_context(|| format!("读取全局变量文件 {} 失败", path.display()))?;
        let values: BTreeMap<String, JsValue> = serde_json::from_slice(&data)?;
        builder = builder
            .collect_js(detector.database(), &StaticGlobals::from(values))
            .await;
    }
    Ok(builder.build())
}

/// `Name: value` 逐行解析，跳过状态行与空行
fn parse_raw_headers(raw: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with("HTTP/") {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .with_context(|| format!("无效的响应头名称：{}", name))?;
        let value = HeaderValue::from_str(value.trim())
            .with_context(|| format!("无效的响应头取值：{}", value))?;
        headers.append(name, value);
    }
    Ok(headers)
}
