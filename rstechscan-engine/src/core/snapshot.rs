use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::enums::MatchField;

/// 多值映射（键 → 取值列表），键已小写
pub type MultiMap = BTreeMap<String, Vec<String>>;

/// 单个技术的 js 全局变量取值（变量路径 → 单元素列表）
pub type JsGlobals = BTreeMap<String, Vec<JsValue>>;

/// 页面 js 全局变量的取值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsValue {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        JsValue::String(value.to_string())
    }
}

impl From<String> for JsValue {
    fn from(value: String) -> Self {
        JsValue::String(value)
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        JsValue::Bool(value)
    }
}

impl From<i64> for JsValue {
    fn from(value: i64) -> Self {
        JsValue::Number(value.into())
    }
}

/// 匹配候选值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate<'a> {
    /// 参与正则匹配的文本
    Text(Cow<'a, str>),
    /// 仅表示“键存在”，直接命中且不提取版本
    Presence,
    /// 无值，不产生证据
    Absent,
}

/// 可转换为匹配候选值的快照取值
pub trait AsCandidate {
    fn as_candidate(&self) -> Candidate<'_>;
}

impl AsCandidate for str {
    #[inline]
    fn as_candidate(&self) -> Candidate<'_> {
        Candidate::Text(Cow::Borrowed(self))
    }
}

impl AsCandidate for String {
    #[inline]
    fn as_candidate(&self) -> Candidate<'_> {
        Candidate::Text(Cow::Borrowed(self.as_str()))
    }
}

impl AsCandidate for JsValue {
    fn as_candidate(&self) -> Candidate<'_> {
        match self {
            JsValue::Bool(true) => Candidate::Presence,
            JsValue::Bool(false) => Candidate::Absent,
            JsValue::Number(n) => Candidate::Text(Cow::Owned(n.to_string())),
            JsValue::String(s) => Candidate::Text(Cow::Borrowed(s.as_str())),
        }
    }
}

/// 页面快照：外部页面采集器的产出，核心只读消费
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub url: Option<String>,
    pub html: Option<String>,
    pub css: Option<String>,
    pub robots: Option<String>,
    pub cert_issuer: Option<String>,
    pub headers: MultiMap,
    pub cookies: MultiMap,
    pub meta: MultiMap,
    pub scripts: Vec<String>,
    /// 技术名称 → 该技术声明的 js 变量取值
    pub js: BTreeMap<String, JsGlobals>,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_meta(mut self, name: &str, content: impl Into<String>) -> Self {
        self.meta
            .entry(name.to_lowercase())
            .or_default()
            .push(content.into());
        self
    }

    pub fn with_script(mut self, src: impl Into<String>) -> Self {
        self.scripts.push(src.into());
        self
    }

    /// js 取值固定包装为单元素列表
    pub fn with_js(mut self, tech: &str, key: &str, value: impl Into<JsValue>) -> Self {
        self.js
            .entry(tech.to_string())
            .or_default()
            .insert(key.to_string(), vec![value.into()]);
        self
    }

    /// 单值字段取值
    pub fn scalar(&self, field: MatchField) -> Option<&str> {
        match field {
            MatchField::Url => self.url.as_deref(),
            MatchField::Html => self.html.as_deref(),
            MatchField::Css => self.css.as_deref(),
            MatchField::Robots => self.robots.as_deref(),
            MatchField::CertIssuer => self.cert_issuer.as_deref(),
            _ => None,
        }
    }

    /// 列表字段取值
    pub fn list(&self, field: MatchField) -> &[String] {
        match field {
            MatchField::Scripts => &self.scripts,
            _ => &[],
        }
    }

    /// 键值字段取值（js 按技术单独取，见 `js_for`）
    pub fn keyed(&self, field: MatchField) -> Option<&MultiMap> {
        match field {
            MatchField::Cookies => Some(&self.cookies),
            MatchField::Meta => Some(&self.meta),
            MatchField::Headers => Some(&self.headers),
            _ => None,
        }
    }

    pub fn js_for(&self, tech: &str) -> Option<&JsGlobals> {
        self.js.get(tech)
    }
}
