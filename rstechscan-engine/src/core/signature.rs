use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::enums::MatchField;
use super::pattern::{build_case_insensitive, Pattern};

/// 技术未声明图标时使用的默认图标
pub const DEFAULT_ICON: &str = "default.svg";

/// Keyed 型字段中单个键对应的模式组（Header/Cookie/Meta/Js 专用）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "KeyedPatternsSpec", into = "KeyedPatternsSpec")]
pub struct KeyedPatterns {
    pub key: String,
    /// 任一模式声明 key_regex 时，键名按大小写不敏感正则编译
    pub key_regex: Option<Regex>,
    pub patterns: Vec<Pattern>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyedPatternsSpec {
    pub key: String,
    pub patterns: Vec<Pattern>,
}

impl KeyedPatterns {
    pub fn new(key: String, patterns: Vec<Pattern>) -> Result<Self, regex::Error> {
        let key_regex = if patterns.iter().any(|p| p.key_is_regex) {
            Some(build_case_insensitive(&key)?)
        } else {
            None
        };
        Ok(Self {
            key,
            key_regex,
            patterns,
        })
    }
}

impl TryFrom<KeyedPatternsSpec> for KeyedPatterns {
    type Error = regex::Error;

    fn try_from(spec: KeyedPatternsSpec) -> Result<Self, Self::Error> {
        Self::new(spec.key, spec.patterns)
    }
}

impl From<KeyedPatterns> for KeyedPatternsSpec {
    fn from(keyed: KeyedPatterns) -> Self {
        KeyedPatternsSpec {
            key: keyed.key,
            patterns: keyed.patterns,
        }
    }
}

/// 字段匹配器，三种形态互斥，按字段名在编译期选定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", content = "patterns", rename_all = "lowercase")]
pub enum FieldMatcher {
    Scalar(Vec<Pattern>),
    List(Vec<Pattern>),
    Keyed(Vec<KeyedPatterns>),
}

impl FieldMatcher {
    pub fn is_empty(&self) -> bool {
        self.pattern_count() == 0
    }

    pub fn pattern_count(&self) -> usize {
        match self {
            FieldMatcher::Scalar(patterns) | FieldMatcher::List(patterns) => patterns.len(),
            FieldMatcher::Keyed(entries) => entries.iter().map(|e| e.patterns.len()).sum(),
        }
    }
}

/// implies / excludes 关联关系
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub target: String,
    pub confidence: i64,
}

/// 技术元信息，无匹配规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechMeta {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub cpe: Option<String>,
    pub icon: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// 编译完成的技术签名，编译后不可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologySignature {
    #[serde(flatten)]
    pub meta: TechMeta,
    /// 仅保存非空匹配器，按字段顺序排列
    #[serde(default)]
    pub matchers: BTreeMap<MatchField, FieldMatcher>,
    #[serde(default)]
    pub implies: Vec<Relation>,
    #[serde(default)]
    pub excludes: Vec<Relation>,
}

impl TechnologySignature {
    #[inline]
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn matcher(&self, field: MatchField) -> Option<&FieldMatcher> {
        self.matchers.get(&field)
    }

    pub fn has_relations(&self) -> bool {
        !self.implies.is_empty() || !self.excludes.is_empty()
    }

    /// js 字段声明的全局变量路径（外部页面采集器据此求值）
    pub fn js_keys(&self) -> impl Iterator<Item = &str> {
        let entries: &[KeyedPatterns] = match self.matchers.get(&MatchField::Js) {
            Some(FieldMatcher::Keyed(entries)) => entries,
            _ => &[],
        };
        entries.iter().map(|e| e.key.as_str())
    }
}
