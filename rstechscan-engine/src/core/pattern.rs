use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 未声明 confidence 属性时的默认置信度
pub const DEFAULT_CONFIDENCE: i64 = 100;

fn default_confidence() -> i64 {
    DEFAULT_CONFIDENCE
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// 构建大小写不敏感的正则
#[inline]
pub fn build_case_insensitive(source: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source).case_insensitive(true).build()
}

/// 模式的静态描述（用于序列化，不含已编译正则）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    /// 已规范化的正则源
    pub regex: String,
    #[serde(default = "default_confidence")]
    pub confidence: i64,
    /// 版本模板（原样保留）
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub key_regex: bool,
    /// 未识别的属性，仅保存
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// 编译后的单条匹配模式
/// 反序列化时重新编译正则，非法正则直接失败
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PatternSpec", into = "PatternSpec")]
pub struct Pattern {
    pub source: String,
    pub regex: Regex,
    pub confidence: i64,
    pub version_template: String,
    pub key_is_regex: bool,
    pub attributes: BTreeMap<String, String>,
}

impl Pattern {
    pub fn from_spec(spec: PatternSpec) -> Result<Self, regex::Error> {
        let regex = build_case_insensitive(&spec.regex)?;
        Ok(Self {
            source: spec.regex,
            regex,
            confidence: spec.confidence,
            version_template: spec.version,
            key_is_regex: spec.key_regex,
            attributes: spec.attributes,
        })
    }

    pub fn to_spec(&self) -> PatternSpec {
        PatternSpec {
            regex: self.source.clone(),
            confidence: self.confidence,
            version: self.version_template.clone(),
            key_regex: self.key_is_regex,
            attributes: self.attributes.clone(),
        }
    }

    #[inline(always)]
    pub fn is_match(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// 是否声明了非空版本模板
    #[inline]
    pub fn has_version(&self) -> bool {
        !self.version_template.trim().is_empty()
    }
}

impl TryFrom<PatternSpec> for Pattern {
    type Error = regex::Error;

    fn try_from(spec: PatternSpec) -> Result<Self, Self::Error> {
        Self::from_spec(spec)
    }
}

impl From<Pattern> for PatternSpec {
    fn from(pattern: Pattern) -> Self {
        PatternSpec {
            regex: pattern.source,
            confidence: pattern.confidence,
            version: pattern.version_template,
            key_regex: pattern.key_is_regex,
            attributes: pattern.attributes,
        }
    }
}
