//! 单个技术定义 → TechnologySignature
use serde_json::Value;
use std::collections::BTreeMap;

use super::pattern_compiler::PatternCompiler;
use super::raw::{CategoryMap, RawTech};
use crate::core::{
    FieldMatcher, FieldShape, KeyedPatterns, MatchField, Pattern, Relation, TechMeta,
    TechnologySignature, DEFAULT_ICON,
};
use crate::error::{CoreError, CoreResult};
use crate::utils::slugify;

const EXPECT_STRINGS: &str = "a string or a list of strings";
const EXPECT_MAP: &str = "a map of strings or lists of strings";

pub struct SignatureCompiler;

impl SignatureCompiler {
    pub fn compile(
        name: &str,
        raw: &RawTech,
        categories: &CategoryMap,
    ) -> CoreResult<TechnologySignature> {
        let mut matchers = BTreeMap::new();
        for field in MatchField::ALL {
            let Some(value) = raw.field(field).filter(|v| !is_blank(v)) else {
                continue;
            };
            let matcher = Self::compile_field(name, field, value)?;
            if !matcher.is_empty() {
                matchers.insert(field, matcher);
            }
        }

        let meta = TechMeta {
            name: name.to_string(),
            slug: slugify(name),
            description: raw.description.clone(),
            website: raw.website.clone(),
            cpe: raw.cpe.clone(),
            icon: raw.icon.clone().unwrap_or_else(|| DEFAULT_ICON.to_string()),
            categories: raw
                .cats
                .iter()
                .filter_map(|id| categories.get(id).cloned())
                .collect(),
        };

        Ok(TechnologySignature {
            meta,
            matchers,
            implies: Self::compile_relations(name, "implies", raw.implies.as_ref())?,
            excludes: Self::compile_relations(name, "excludes", raw.excludes.as_ref())?,
        })
    }

    fn compile_field(name: &str, field: MatchField, value: &Value) -> CoreResult<FieldMatcher> {
        match field.shape() {
            FieldShape::Scalar => Ok(FieldMatcher::Scalar(Self::compile_patterns(
                name, field, value,
            )?)),
            FieldShape::List => Ok(FieldMatcher::List(Self::compile_patterns(
                name, field, value,
            )?)),
            FieldShape::Keyed => {
                let Value::Object(map) = value else {
                    return Err(shape_error(name, field.as_str(), EXPECT_MAP));
                };
                let mut entries: Vec<KeyedPatterns> = Vec::with_capacity(map.len());
                for (key, raw_patterns) in map {
                    let key = if field.case_sensitive_keys() {
                        key.clone()
                    } else {
                        key.to_lowercase()
                    };
                    let patterns = Self::compile_patterns(name, field, raw_patterns)?;
                    if patterns.is_empty() {
                        continue;
                    }
                    let keyed = KeyedPatterns::new(key.clone(), patterns).map_err(|source| {
                        CoreError::InvalidPattern {
                            tech: name.to_string(),
                            field,
                            pattern: key,
                            source,
                        }
                    })?;
                    // 小写后键名冲突：后者覆盖前者
                    match entries.iter_mut().find(|e| e.key == keyed.key) {
                        Some(existing) => *existing = keyed,
                        None => entries.push(keyed),
                    }
                }
                Ok(FieldMatcher::Keyed(entries))
            }
        }
    }

    fn compile_patterns(name: &str, field: MatchField, value: &Value) -> CoreResult<Vec<Pattern>> {
        raw_strings(value)
            .ok_or_else(|| shape_error(name, field.as_str(), EXPECT_STRINGS))?
            .into_iter()
            .map(|raw| PatternCompiler::compile(raw, name, field))
            .collect()
    }

    /// 关联关系沿用模式语法：首段为目标技术名，confidence 属性为权重
    fn compile_relations(
        name: &str,
        kind: &str,
        value: Option<&Value>,
    ) -> CoreResult<Vec<Relation>> {
        let Some(value) = value.filter(|v| !is_blank(v)) else {
            return Ok(Vec::new());
        };
        let raws = raw_strings(value).ok_or_else(|| shape_error(name, kind, EXPECT_STRINGS))?;
        Ok(raws
            .into_iter()
            .map(PatternCompiler::parse)
            .filter(|parsed| !parsed.value.trim().is_empty())
            .map(|parsed| Relation {
                target: parsed.value.trim().to_string(),
                confidence: parsed.confidence,
            })
            .collect())
    }
}

/// null / "" / [] / {} 视为未声明
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// 字符串或字符串列表展开为模式字符串列表，其他形态返回 None
fn raw_strings(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(s) => Some(vec![s.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

fn shape_error(tech: &str, field: &str, expected: &'static str) -> CoreError {
    CoreError::UnexpectedShape {
        tech: tech.to_string(),
        field: field.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawTech {
        serde_json::from_value(value).unwrap()
    }

    fn categories() -> CategoryMap {
        let mut map = CategoryMap::default();
        map.insert(1, "CMS".to_string());
        map
    }

    #[test]
    fn compiles_all_three_shapes() {
        let tech = raw(json!({
            "cats": [1, 99],
            "html": "<div id=\"foo\"",
            "scripts": ["foo\\.js", "foo-([\\d.]+)\\.js\\;version:\\1"],
            "headers": {"X-Powered-By": "Foo"},
            "js": {"Foo.Version": "([\\d.]+)\\;version:\\1"}
        }));
        let sig = SignatureCompiler::compile("Foo CMS", &tech, &categories()).unwrap();

        assert_eq!(sig.meta.slug, "foo-cms");
        assert_eq!(sig.meta.icon, DEFAULT_ICON);
        assert_eq!(sig.meta.categories, vec!["CMS".to_string()]);

        assert!(matches!(sig.matcher(MatchField::Html), Some(FieldMatcher::Scalar(p)) if p.len() == 1));
        assert!(matches!(sig.matcher(MatchField::Scripts), Some(FieldMatcher::List(p)) if p.len() == 2));
        match sig.matcher(MatchField::Headers) {
            Some(FieldMatcher::Keyed(entries)) => assert_eq!(entries[0].key, "x-powered-by"),
            other => panic!("unexpected matcher: {other:?}"),
        }
        match sig.matcher(MatchField::Js) {
            Some(FieldMatcher::Keyed(entries)) => assert_eq!(entries[0].key, "Foo.Version"),
            other => panic!("unexpected matcher: {other:?}"),
        }
        assert!(sig.matcher(MatchField::Url).is_none());
    }

    #[test]
    fn blank_fields_produce_no_matcher() {
        let tech = raw(json!({"url": "", "html": [], "meta": {}, "cookies": null}));
        let sig = SignatureCompiler::compile("Empty", &tech, &CategoryMap::default()).unwrap();
        assert!(sig.matchers.is_empty());
    }

    #[test]
    fn relations_use_pattern_grammar() {
        let tech = raw(json!({
            "implies": ["PHP\\;confidence:50", "MySQL"],
            "excludes": "Drupal"
        }));
        let sig = SignatureCompiler::compile("WordPress", &tech, &CategoryMap::default()).unwrap();
        assert_eq!(
            sig.implies,
            vec![
                Relation { target: "PHP".to_string(), confidence: 50 },
                Relation { target: "MySQL".to_string(), confidence: 100 },
            ]
        );
        assert_eq!(sig.excludes[0].target, "Drupal");
        assert!(sig.has_relations());
    }

    #[test]
    fn shape_mismatch_is_fatal() {
        let tech = raw(json!({"headers": "X-Foo"}));
        let err = SignatureCompiler::compile("Foo", &tech, &CategoryMap::default()).unwrap_err();
        assert!(matches!(err, CoreError::UnexpectedShape { ref field, .. } if field == "headers"));

        let tech = raw(json!({"html": {"a": "b"}}));
        assert!(SignatureCompiler::compile("Foo", &tech, &CategoryMap::default()).is_err());

        let tech = raw(json!({"scripts": ["ok", 3]}));
        assert!(SignatureCompiler::compile("Foo", &tech, &CategoryMap::default()).is_err());
    }

    #[test]
    fn invalid_regex_aborts_signature() {
        let tech = raw(json!({"meta": {"generator": "Foo (\\d+"}}));
        let err = SignatureCompiler::compile("Foo", &tech, &CategoryMap::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern { field: MatchField::Meta, .. }));
    }

    #[test]
    fn keyed_entries_keep_document_order() {
        let tech: RawTech = serde_json::from_str(
            r#"{"headers": {"X-Version": "(.+)", "Server": "foo/(.+)", "Age": ""}}"#,
        )
        .unwrap();
        let sig = SignatureCompiler::compile("Foo", &tech, &CategoryMap::default()).unwrap();
        match sig.matcher(MatchField::Headers) {
            Some(FieldMatcher::Keyed(entries)) => {
                let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
                assert_eq!(keys, vec!["x-version", "server", "age"]);
            }
            other => panic!("unexpected matcher: {other:?}"),
        }
    }

    #[test]
    fn key_regex_compiles_key_expression() {
        let tech = raw(json!({"cookies": {"^wp-settings-\\d+$": "\\;key_regex:true"}}));
        let sig = SignatureCompiler::compile("WordPress", &tech, &CategoryMap::default()).unwrap();
        match sig.matcher(MatchField::Cookies) {
            Some(FieldMatcher::Keyed(entries)) => {
                let key_regex = entries[0].key_regex.as_ref().unwrap();
                assert!(key_regex.is_match("wp-settings-1"));
            }
            other => panic!("unexpected matcher: {other:?}"),
        }
    }
}
