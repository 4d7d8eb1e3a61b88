//! 页面快照构建：由 URL、响应头、响应体与脚本全局变量组装 PageSnapshot
use std::collections::BTreeMap;

use async_trait::async_trait;
use http::header::HeaderMap;
use once_cell::sync::Lazy;
use regex::Regex;
use rstechscan_engine::{JsValue, PageSnapshot, RuleDatabase};
use url::Url;

use crate::error::ScanResult;
use crate::snapshot::header_converter::HeaderConverter;
use crate::snapshot::html_extractor::HtmlExtractor;

/// `a[b]` → `a.b`
static BRACKET_ACCESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]*)\]").expect("static bracket regex")
});

/// 无 scheme 的输入补全为 `http://`
pub fn normalize_url(input: &str) -> ScanResult<Url> {
    let trimmed = input.trim();
    let url = if trimmed.contains("://") {
        Url::parse(trimmed)?
    } else {
        Url::parse(&format!("http://{}", trimmed))?
    };
    Ok(url)
}

/// js 变量路径拆分：方括号访问改写为点号访问后按 `.` 拆分
pub fn js_path(key: &str) -> Vec<String> {
    BRACKET_ACCESS
        .replace_all(key, ".$1")
        .split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 页面脚本全局变量求值（外部浏览器的边界）
#[async_trait]
pub trait ScriptGlobals: Send + Sync {
    /// 按属性路径取值，未定义返回 None
    async fn evaluate(&self, path: &[String]) -> Option<JsValue>;
}

/// 预先采集好的全局变量表，键为点号路径
#[derive(Debug, Clone, Default)]
pub struct StaticGlobals {
    values: BTreeMap<String, JsValue>,
}

impl StaticGlobals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, value: impl Into<JsValue>) -> Self {
        self.values.insert(path.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, value: JsValue) {
        self.values.insert(path.into(), value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<BTreeMap<String, JsValue>> for StaticGlobals {
    fn from(values: BTreeMap<String, JsValue>) -> Self {
        Self { values }
    }
}

#[async_trait]
impl ScriptGlobals for StaticGlobals {
    async fn evaluate(&self, path: &[String]) -> Option<JsValue> {
        self.values.get(&path.join(".")).cloned()
    }
}

/// 快照构建器
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    snapshot: PageSnapshot,
}

impl SnapshotBuilder {
    /// URL 先规范化（补全 scheme）
    pub fn new(url: &str) -> ScanResult<Self> {
        let url = normalize_url(url)?;
        Ok(Self {
            snapshot: PageSnapshot::new(url.as_str()),
        })
    }

    /// 响应头，同时从 `set-cookie` 解析 cookies
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        let map = HeaderConverter::to_multi_map(headers);
        self.snapshot.cookies = HeaderConverter::parse_set_cookies(&map);
        self.snapshot.headers = map;
        self
    }

    /// 响应体，同时提取 script-src 与 meta
    pub fn html(mut self, html: impl Into<String>) -> Self {
        let html = html.into();
        let (scripts, meta) = HtmlExtractor::extract(&html).into_parts();
        self.snapshot.scripts = scripts;
        self.snapshot.meta = meta;
        self.snapshot.html = Some(html);
        self
    }

    pub fn css(mut self, css: impl Into<String>) -> Self {
        self.snapshot.css = Some(css.into());
        self
    }

    pub fn robots(mut self, robots: impl Into<String>) -> Self {
        self.snapshot.robots = Some(robots.into());
        self
    }

    pub fn cert_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.snapshot.cert_issuer = Some(issuer.into());
        self
    }

    /// 对每个声明了 js 的技术逐一求值，`None`/`false` 视为不存在
    pub async fn collect_js(mut self, db: &RuleDatabase, globals: &dyn ScriptGlobals) -> Self {
        let mut collected = 0usize;
        for sig in db.iter() {
            for key in sig.js_keys() {
                let path = js_path(key);
                if path.is_empty() {
                    continue;
                }
                match globals.evaluate(&path).await {
                    None | Some(JsValue::Bool(false)) => {}
                    Some(value) => {
                        self.snapshot
                            .js
                            .entry(sig.name().to_string())
                            .or_default()
                            .insert(key.to_string(), vec![value]);
                        collected += 1;
                    }
                }
            }
        }
        tracing::debug!("js 全局变量采集完成：{} 项", collected);
        self
    }

    pub fn build(self) -> PageSnapshot {
        self.snapshot
    }
}
