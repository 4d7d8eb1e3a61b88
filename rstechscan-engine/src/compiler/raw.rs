//! 原始规则文档模型（Wappalyzer technologies.json 结构）
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::core::MatchField;
use crate::error::CoreResult;

/// 分类 ID → 分类名
pub type CategoryMap = FxHashMap<u32, String>;

/// 原始分类定义：纯名称或带优先级的对象
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawCategory {
    Name(String),
    Entry {
        name: String,
        #[serde(default)]
        priority: Option<u32>,
    },
}

impl RawCategory {
    pub fn name(&self) -> &str {
        match self {
            RawCategory::Name(name) => name,
            RawCategory::Entry { name, .. } => name,
        }
    }
}

/// 原始规则文档
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRuleDocument {
    /// JSON 对象键恒为字符串，整数 ID 在 `category_map` 中解析
    #[serde(default)]
    pub categories: IndexMap<String, RawCategory>,
    /// 保持文档中的声明顺序
    #[serde(default, alias = "apps")]
    pub technologies: IndexMap<String, RawTech>,
}

impl RawRuleDocument {
    pub fn from_json_str(content: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// 分类 ID 解析，非数字 ID 忽略
    pub fn category_map(&self) -> CategoryMap {
        let mut map = CategoryMap::default();
        for (id, category) in &self.categories {
            match id.trim().parse::<u32>() {
                Ok(id) => {
                    map.insert(id, category.name().to_string());
                }
                Err(_) => log::warn!("Ignoring category with non-numeric id {:?}", id),
            }
        }
        map
    }
}

/// 原始技术定义，匹配字段保持未解析的 JSON 值
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawTech {
    #[serde(default)]
    pub cats: Vec<u32>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cpe: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub css: Option<Value>,
    #[serde(default, alias = "certIssuer", skip_serializing_if = "Option::is_none")]
    pub cert_issuer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robots: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implies: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Value>,

    /// 未识别字段（saas、pricing、dom 等），仅保存
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RawTech {
    pub fn field(&self, field: MatchField) -> Option<&Value> {
        let value = match field {
            MatchField::Url => &self.url,
            MatchField::Html => &self.html,
            MatchField::Css => &self.css,
            MatchField::Robots => &self.robots,
            MatchField::CertIssuer => &self.cert_issuer,
            MatchField::Scripts => &self.scripts,
            MatchField::Cookies => &self.cookies,
            MatchField::Meta => &self.meta,
            MatchField::Headers => &self.headers,
            MatchField::Js => &self.js,
        };
        value.as_ref()
    }
}
