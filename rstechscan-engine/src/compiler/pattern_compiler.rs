//! 模式字符串编译器
//! 语法：`<regex>\;name:value\;name:value...`
use std::collections::BTreeMap;

use crate::core::{build_case_insensitive, Pattern, DEFAULT_CONFIDENCE};
use crate::core::MatchField;
use crate::error::{CoreError, CoreResult};

/// 属性分隔符（字面量 `\;`）
const SEGMENT_SEPARATOR: &str = "\\;";

/// 解析完成但未编译的模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPattern {
    /// 已规范化的首段（正则源，关联关系中即目标技术名）
    pub value: String,
    pub confidence: i64,
    pub version: String,
    pub key_regex: bool,
    /// 未识别属性
    pub attributes: BTreeMap<String, String>,
}

pub struct PatternCompiler;

impl PatternCompiler {
    /// 解析模式字符串，应用默认值（confidence=100，version=""）
    pub fn parse(raw: &str) -> ParsedPattern {
        let mut segments = raw.split(SEGMENT_SEPARATOR);
        let value = Self::normalize(segments.next().unwrap_or_default());

        let mut parsed = ParsedPattern {
            value,
            confidence: DEFAULT_CONFIDENCE,
            version: String::new(),
            key_regex: false,
            attributes: BTreeMap::new(),
        };

        for segment in segments {
            // 无冒号的属性没有取值，保持默认
            let Some((name, value)) = segment.split_once(':') else {
                continue;
            };
            match name {
                "confidence" => parsed.confidence = parse_lenient_int(value),
                "version" => parsed.version = value.to_string(),
                "key_regex" => parsed.key_regex = is_truthy(value),
                _ => {
                    parsed.attributes.insert(name.to_string(), value.to_string());
                }
            }
        }
        parsed
    }

    /// 正则源规范化：`\/` → `/`，`[^]` → `.`，`[\s\S]*` → `.*`
    pub fn normalize(source: &str) -> String {
        source
            .replace("\\/", "/")
            .replace("[^]", ".")
            .replace("[\\s\\S]*", ".*")
    }

    /// 解析并编译，正则非法时返回携带技术名与字段的错误
    pub fn compile(raw: &str, tech: &str, field: MatchField) -> CoreResult<Pattern> {
        let parsed = Self::parse(raw);
        let regex = build_case_insensitive(&parsed.value).map_err(|source| {
            CoreError::InvalidPattern {
                tech: tech.to_string(),
                field,
                pattern: raw.to_string(),
                source,
            }
        })?;
        Ok(Pattern {
            source: parsed.value,
            regex,
            confidence: parsed.confidence,
            version_template: parsed.version,
            key_is_regex: parsed.key_regex,
            attributes: parsed.attributes,
        })
    }
}

/// 宽松整数解析：忽略前导空白，可选符号 + 前导数字，其余情况为 0
fn parse_lenient_int(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude = digits[..end]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
}
