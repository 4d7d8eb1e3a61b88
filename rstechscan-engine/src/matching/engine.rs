//! 匹配引擎：页面快照 × 规则库 → 原始证据
use std::collections::BTreeMap;

use super::version::resolve_version;
use crate::core::{
    AsCandidate, Candidate, Evidence, EvidenceField, FieldMatcher, KeyedPatterns, MatchField,
    PageSnapshot, Pattern, TechnologySignature,
};
use crate::database::RuleDatabase;
use crate::utils::preview;

const LOG_PREVIEW_CHARS: usize = 80;

pub struct MatchingEngine;

impl MatchingEngine {
    /// 按技术顺序、字段顺序收集全部证据，证据顺序即发现顺序
    pub fn collect_evidence(db: &RuleDatabase, snapshot: &PageSnapshot) -> Vec<Evidence> {
        let mut evidence = Vec::new();
        for sig in db.iter() {
            Self::match_signature(sig, snapshot, &mut evidence);
        }
        evidence
    }

    /// 单个技术的全部字段匹配
    pub fn match_signature(
        sig: &TechnologySignature,
        snapshot: &PageSnapshot,
        out: &mut Vec<Evidence>,
    ) {
        for (&field, matcher) in &sig.matchers {
            match matcher {
                FieldMatcher::Scalar(patterns) => {
                    let Some(value) = snapshot.scalar(field) else {
                        continue;
                    };
                    for pattern in patterns {
                        Self::test(sig, field, None, pattern, value, out);
                    }
                }
                FieldMatcher::List(patterns) => {
                    for value in snapshot.list(field) {
                        for pattern in patterns {
                            Self::test(sig, field, None, pattern, value, out);
                        }
                    }
                }
                FieldMatcher::Keyed(entries) => {
                    if field == MatchField::Js {
                        if let Some(globals) = snapshot.js_for(sig.name()) {
                            Self::match_keyed(sig, field, entries, globals, out);
                        }
                    } else if let Some(values) = snapshot.keyed(field) {
                        Self::match_keyed(sig, field, entries, values, out);
                    }
                }
            }
        }
    }

    fn match_keyed<T: AsCandidate>(
        sig: &TechnologySignature,
        field: MatchField,
        entries: &[KeyedPatterns],
        data: &BTreeMap<String, Vec<T>>,
        out: &mut Vec<Evidence>,
    ) {
        for entry in entries {
            for pattern in &entry.patterns {
                // 候选值按模式解析：精确键查找，或正则键命中的所有取值并集
                let candidates: Vec<&T> = match (&entry.key_regex, pattern.key_is_regex) {
                    (Some(key_regex), true) => data
                        .iter()
                        .filter(|(key, _)| key_regex.is_match(key))
                        .flat_map(|(_, values)| values.iter())
                        .collect(),
                    _ => data
                        .get(&entry.key)
                        .map(|values| values.iter().collect())
                        .unwrap_or_default(),
                };
                for value in candidates {
                    Self::test(sig, field, Some(&entry.key), pattern, value, out);
                }
            }
        }
    }

    fn test<T: AsCandidate + ?Sized>(
        sig: &TechnologySignature,
        field: MatchField,
        key: Option<&str>,
        pattern: &Pattern,
        value: &T,
        out: &mut Vec<Evidence>,
    ) {
        let resolved_version = match value.as_candidate() {
            Candidate::Absent => return,
            // 仅存在性命中，不提取版本
            Candidate::Presence => String::new(),
            Candidate::Text(text) => {
                if !pattern.is_match(&text) {
                    return;
                }
                if pattern.has_version() {
                    resolve_version(&pattern.version_template, &pattern.regex, &text)
                        .unwrap_or_default()
                } else {
                    String::new()
                }
            }
        };

        log::debug!(
            "[{}] {} matched {} /{}/ version={:?}",
            field,
            sig.name(),
            key.unwrap_or("-"),
            preview(&pattern.source, LOG_PREVIEW_CHARS),
            resolved_version
        );

        out.push(Evidence {
            key: key.map(str::to_string),
            field: EvidenceField::Matched(field),
            tech_name: sig.name().to_string(),
            confidence: pattern.confidence,
            version_template: pattern.version_template.clone(),
            resolved_version,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RawRuleDocument;
    use crate::core::JsValue;

    fn database(json: &str) -> RuleDatabase {
        RuleDatabase::compile(&RawRuleDocument::from_json_str(json).unwrap()).unwrap()
    }

    #[test]
    fn scalar_list_and_keyed_fields_emit_evidence() {
        let db = database(
            r#"{"technologies": {"Foo": {
                "url": "example\\.com",
                "scripts": "foo-([\\d.]+)\\.js\\;version:\\1",
                "headers": {"X-Foo": ""}
            }}}"#,
        );
        let snapshot = PageSnapshot::new("https://example.com/")
            .with_script("/static/foo-1.2.js")
            .with_script("/static/bar.js")
            .with_header("x-foo", "anything");

        let evidence = MatchingEngine::collect_evidence(&db, &snapshot);
        let fields: Vec<_> = evidence.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["url", "scripts", "headers"]);
        assert_eq!(evidence[1].resolved_version, "1.2");
        assert_eq!(evidence[2].key.as_deref(), Some("x-foo"));
    }

    #[test]
    fn missing_snapshot_fields_yield_nothing() {
        let db = database(r#"{"technologies": {"Foo": {"html": "foo", "css": "foo", "cookies": {"foo": ""}}}}"#);
        let evidence = MatchingEngine::collect_evidence(&db, &PageSnapshot::default());
        assert!(evidence.is_empty());
    }

    #[test]
    fn js_presence_numeric_and_false_values() {
        let db = database(
            r#"{"technologies": {"Lib": {"js": {
                "Lib.loaded": "",
                "Lib.major": "^(\\d+)$\\;version:\\1",
                "Lib.disabled": ""
            }}}}"#,
        );
        let snapshot = PageSnapshot::default()
            .with_js("Lib", "Lib.loaded", true)
            .with_js("Lib", "Lib.major", 7i64)
            .with_js("Lib", "Lib.disabled", false)
            .with_js("Other", "Lib.loaded", JsValue::from("x"));

        let evidence = MatchingEngine::collect_evidence(&db, &snapshot);
        assert_eq!(evidence.len(), 2);
        let presence = evidence.iter().find(|e| e.key.as_deref() == Some("Lib.loaded")).unwrap();
        assert_eq!(presence.resolved_version, "");
        let major = evidence.iter().find(|e| e.key.as_deref() == Some("Lib.major")).unwrap();
        assert_eq!(major.resolved_version, "7");
    }

    #[test]
    fn js_keys_are_case_sensitive_values_are_not() {
        let db = database(r#"{"technologies": {"Foo": {"js": {"Foo.Version": "foo v(\\d+)\\;version:\\1"}}}}"#);

        let lowered = PageSnapshot::default().with_js("Foo", "foo.version", JsValue::from("foo v2"));
        assert!(MatchingEngine::collect_evidence(&db, &lowered).is_empty());

        let exact = PageSnapshot::default().with_js("Foo", "Foo.Version", JsValue::from("FOO V2"));
        let evidence = MatchingEngine::collect_evidence(&db, &exact);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].key.as_deref(), Some("Foo.Version"));
        assert_eq!(evidence[0].resolved_version, "2");
    }

    #[test]
    fn regex_keys_union_matching_values() {
        let db = database(
            r#"{"technologies": {"WordPress": {"cookies": {"^wp-settings-\\d+$": "\\;key_regex:1\\;confidence:40"}}}}"#,
        );
        let snapshot = PageSnapshot::default()
            .with_cookie("wp-settings-1", "a")
            .with_cookie("wp-settings-2", "b")
            .with_cookie("other", "c");
        let evidence = MatchingEngine::collect_evidence(&db, &snapshot);
        assert_eq!(evidence.len(), 2);
        assert!(evidence.iter().all(|e| e.confidence == 40));
    }

    #[test]
    fn value_regex_is_case_insensitive() {
        let db = database(r#"{"technologies": {"Nginx": {"headers": {"server": "nginx(?:/([\\d.]+))?\\;version:\\1"}}}}"#);
        let snapshot = PageSnapshot::default().with_header("Server", "NGINX/1.25.3");
        let evidence = MatchingEngine::collect_evidence(&db, &snapshot);
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].resolved_version, "1.25.3");
    }
}
