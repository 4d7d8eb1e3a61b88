//! 编译后的规则库：构建完成后只读，可跨分析任务共享
use rustc_hash::FxHashMap;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compiler::{CategoryMap, RawRuleDocument, RawTech, SignatureCompiler};
use crate::core::{DetectionResult, PageSnapshot, TechnologySignature};
use crate::error::CoreResult;

/// 编译失败时的处理策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompileMode {
    /// 任一技术编译失败即整体失败
    #[default]
    Strict,
    /// 丢弃编译失败的整条技术并记录告警，从不保留部分编译结果
    SkipInvalid,
}

/// 规则库
#[derive(Debug, Clone, Default)]
pub struct RuleDatabase {
    /// 按名称排序
    signatures: Vec<Arc<TechnologySignature>>,
    index: FxHashMap<String, usize>,
    /// 任一技术声明了 implies/excludes
    has_relations: bool,
}

impl RuleDatabase {
    /// 严格模式编译整份规则文档
    pub fn compile(document: &RawRuleDocument) -> CoreResult<Self> {
        Self::compile_with(document, CompileMode::Strict, |_, raw, _| raw)
    }

    /// 编译规则文档，每条技术编译前先经过 hook 处理
    pub fn compile_with<F>(document: &RawRuleDocument, mode: CompileMode, mut hook: F) -> CoreResult<Self>
    where
        F: FnMut(&str, RawTech, &CategoryMap) -> RawTech,
    {
        let categories = document.category_map();
        let mut signatures = Vec::with_capacity(document.technologies.len());
        let mut skipped = 0usize;

        for (name, raw) in &document.technologies {
            let raw = hook(name, raw.clone(), &categories);
            match SignatureCompiler::compile(name, &raw, &categories) {
                Ok(sig) => signatures.push(sig),
                Err(e) if mode == CompileMode::SkipInvalid => {
                    log::warn!("Skipping technology {}: {}", name, e);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let db = Self::from_signatures(signatures);
        log::info!(
            "Rule database compiled: {} technologies, {} skipped, relations={}",
            db.len(),
            skipped,
            db.has_relations
        );
        Ok(db)
    }

    /// 由签名列表构建，同名签名后者覆盖前者
    pub fn from_signatures<I>(signatures: I) -> Self
    where
        I: IntoIterator<Item = TechnologySignature>,
    {
        let by_name: BTreeMap<String, Arc<TechnologySignature>> = signatures
            .into_iter()
            .map(|sig| (sig.meta.name.clone(), Arc::new(sig)))
            .collect();
        Self::from_sorted(by_name)
    }

    fn from_sorted(by_name: BTreeMap<String, Arc<TechnologySignature>>) -> Self {
        let mut index = FxHashMap::default();
        let mut signatures = Vec::with_capacity(by_name.len());
        for (i, (name, sig)) in by_name.into_iter().enumerate() {
            index.insert(name, i);
            signatures.push(sig);
        }
        let has_relations = signatures.iter().any(|s| s.has_relations());
        Self {
            signatures,
            index,
            has_relations,
        }
    }

    /// 合并生成新库，`other` 中的同名技术整体覆盖当前库
    pub fn merge(&self, other: &RuleDatabase) -> RuleDatabase {
        let mut by_name: BTreeMap<String, Arc<TechnologySignature>> = self
            .signatures
            .iter()
            .map(|sig| (sig.meta.name.clone(), Arc::clone(sig)))
            .collect();
        for sig in &other.signatures {
            by_name.insert(sig.meta.name.clone(), Arc::clone(sig));
        }
        Self::from_sorted(by_name)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TechnologySignature>> {
        self.index.get(name).map(|&i| &self.signatures[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TechnologySignature>> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    #[inline]
    pub fn has_relations(&self) -> bool {
        self.has_relations
    }

    /// 对单个页面快照执行完整分析
    pub fn analyze(&self, snapshot: &PageSnapshot) -> Vec<DetectionResult> {
        crate::analysis::analyze(self, snapshot)
    }
}

// 序列化为 {技术名 → 签名} 映射，即编译结果缓存格式
impl Serialize for RuleDatabase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.signatures.len()))?;
        for sig in &self.signatures {
            map.serialize_entry(sig.name(), sig.as_ref())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleDatabase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let by_name = BTreeMap::<String, TechnologySignature>::deserialize(deserializer)?;
        Ok(Self::from_signatures(by_name.into_values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MatchField;
    use crate::error::CoreError;

    fn document(json: &str) -> RawRuleDocument {
        RawRuleDocument::from_json_str(json).unwrap()
    }

    #[test]
    fn compiles_sorted_and_indexed() {
        let db = RuleDatabase::compile(&document(
            r#"{"technologies": {"Zeta": {"html": "zeta"}, "Alpha": {"html": "alpha"}}}"#,
        ))
        .unwrap();
        let names: Vec<_> = db.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert!(db.get("Zeta").is_some());
        assert!(!db.has_relations());
    }

    #[test]
    fn strict_mode_rejects_invalid_regex() {
        let doc = document(r#"{"technologies": {"Bad": {"html": "(oops"}, "Good": {"html": "ok"}}}"#);
        let err = RuleDatabase::compile(&doc).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern { ref tech, .. } if tech == "Bad"));
    }

    #[test]
    fn skip_mode_drops_whole_technology() {
        let doc = document(
            r#"{"technologies": {"Bad": {"html": "ok", "url": "(oops"}, "Good": {"html": "ok"}}}"#,
        );
        let db = RuleDatabase::compile_with(&doc, CompileMode::SkipInvalid, |_, raw, _| raw).unwrap();
        assert_eq!(db.len(), 1);
        assert!(db.get("Bad").is_none());
    }

    #[test]
    fn hook_rewrites_raw_definitions() {
        let doc = document(r#"{"technologies": {"Foo": {"html": "foo"}}}"#);
        let db = RuleDatabase::compile_with(&doc, CompileMode::Strict, |name, mut raw, _| {
            raw.website = Some(format!("https://{}.example", name.to_lowercase()));
            raw
        })
        .unwrap();
        assert_eq!(
            db.get("Foo").unwrap().meta.website.as_deref(),
            Some("https://foo.example")
        );
    }

    #[test]
    fn merge_overrides_by_name() {
        let base = RuleDatabase::compile(&document(
            r#"{"technologies": {"Foo": {"html": "foo"}, "Bar": {"html": "bar"}}}"#,
        ))
        .unwrap();
        let ours = RuleDatabase::compile(&document(
            r#"{"technologies": {"Foo": {"url": "foo", "implies": "Bar"}}}"#,
        ))
        .unwrap();
        let merged = base.merge(&ours);
        assert_eq!(merged.len(), 2);
        let foo = merged.get("Foo").unwrap();
        assert!(foo.matcher(MatchField::Html).is_none());
        assert!(foo.matcher(MatchField::Url).is_some());
        assert!(merged.has_relations());
    }

    #[test]
    fn cache_payload_restores_database() {
        let db = RuleDatabase::compile(&document(
            r#"{"categories": {"1": {"name": "CMS"}},
                "technologies": {"Foo": {"cats": [1], "headers": {"X-Foo": "bar\\;version:1.0"}, "implies": "PHP"}}}"#,
        ))
        .unwrap();
        let json = serde_json::to_string(&db).unwrap();
        let restored: RuleDatabase = serde_json::from_str(&json).unwrap();

        let foo = restored.get("Foo").unwrap();
        assert_eq!(foo.meta.categories, vec!["CMS".to_string()]);
        assert_eq!(foo.implies[0].target, "PHP");
        assert!(restored.has_relations());
        assert!(foo.matcher(MatchField::Headers).is_some());
    }
}
