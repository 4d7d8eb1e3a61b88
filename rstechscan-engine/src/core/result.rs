//! 技术检测结果结构与报告输出

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::evidence::Evidence;
use super::signature::{TechMeta, TechnologySignature};

/// 单个技术的检测结果，仅在一次分析内存活
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub name: String,
    /// 目标技术不在规则库中时为空
    pub tech: Option<Arc<TechnologySignature>>,
    /// 不做截断，可为负或超过 100
    pub confidence: i64,
    pub versions: Vec<String>,
    pub best_version: Option<String>,
    pub implied: bool,
    /// 命中发现顺序，不可重排
    pub evidence: Vec<Evidence>,
}

impl DetectionResult {
    pub fn new(name: impl Into<String>, tech: Option<Arc<TechnologySignature>>) -> Self {
        Self {
            name: name.into(),
            tech,
            confidence: 0,
            versions: Vec::new(),
            best_version: None,
            implied: false,
            evidence: Vec::new(),
        }
    }

    pub fn meta(&self) -> Option<&TechMeta> {
        self.tech.as_deref().map(|t| &t.meta)
    }

    /// 排序分值：推导结果降权 1.5 倍
    pub fn rank_score(&self) -> f64 {
        let divisor = if self.implied { 1.5 } else { 1.0 };
        self.confidence as f64 / divisor
    }

    pub fn to_report(&self) -> TechReport {
        let meta = self.meta();
        TechReport {
            name: self.name.clone(),
            confidence: self.confidence,
            versions: self.versions.clone(),
            best_version: self.best_version.clone(),
            implied: self.implied,
            categories: meta.map(|m| m.categories.clone()),
            icon: meta.map(|m| m.icon.clone()),
            slug: meta.map(|m| m.slug.clone()),
            cpe: meta.and_then(|m| m.cpe.clone()),
            website: meta.and_then(|m| m.website.clone()),
            description: meta.and_then(|m| m.description.clone()),
            raw: self.evidence.clone(),
        }
    }
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.best_version {
            Some(v) => write!(f, "{} {} ({})", self.name, v, self.confidence),
            None => write!(f, "{} ({})", self.name, self.confidence),
        }
    }
}

/// 对外输出的稳定结果记录，元信息缺失时各字段序列化为 null
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechReport {
    pub name: String,
    pub confidence: i64,
    pub versions: Vec<String>,
    pub best_version: Option<String>,
    pub implied: bool,
    pub categories: Option<Vec<String>>,
    pub icon: Option<String>,
    pub slug: Option<String>,
    pub cpe: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub raw: Vec<Evidence>,
}

/// 按首次出现顺序保存的结果集合，附名称索引
#[derive(Debug, Default)]
pub struct ResultSet {
    results: Vec<DetectionResult>,
    index: FxHashMap<String, usize>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DetectionResult> {
        self.index.get(name).map(|&i| &self.results[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DetectionResult> {
        match self.index.get(name) {
            Some(&i) => self.results.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 已存在同名结果时不覆盖，返回 false
    pub fn insert(&mut self, result: DetectionResult) -> bool {
        if self.index.contains_key(&result.name) {
            return false;
        }
        self.index.insert(result.name.clone(), self.results.len());
        self.results.push(result);
        true
    }

    /// 同名结果原位替换（保留原位置），不存在则追加
    pub fn replace(&mut self, result: DetectionResult) {
        match self.index.get(&result.name) {
            Some(&i) => self.results[i] = result,
            None => {
                self.index.insert(result.name.clone(), self.results.len());
                self.results.push(result);
            }
        }
    }

    /// 取已有结果，不存在则按构造器新建
    pub fn entry_or_insert_with<F>(&mut self, name: &str, create: F) -> &mut DetectionResult
    where
        F: FnOnce() -> DetectionResult,
    {
        let idx = match self.index.get(name) {
            Some(&i) => i,
            None => {
                let idx = self.results.len();
                self.results.push(create());
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.results[idx]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectionResult> {
        self.results.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DetectionResult> {
        self.results.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_vec(self) -> Vec<DetectionResult> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_never_overwrites() {
        let mut set = ResultSet::new();
        let mut first = DetectionResult::new("Foo", None);
        first.confidence = 10;
        assert!(set.insert(first));
        assert!(!set.insert(DetectionResult::new("Foo", None)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("Foo").unwrap().confidence, 10);
    }

    #[test]
    fn report_without_metadata_serializes_nulls() {
        let result = DetectionResult::new("Ghost", None);
        let json = serde_json::to_value(result.to_report()).unwrap();
        assert_eq!(json["name"], "Ghost");
        assert!(json["bestVersion"].is_null());
        assert!(json["categories"].is_null());
        assert_eq!(json["raw"], serde_json::json!([]));
    }

    #[test]
    fn implied_results_rank_lower() {
        let mut direct = DetectionResult::new("A", None);
        direct.confidence = 60;
        let mut implied = DetectionResult::new("B", None);
        implied.confidence = 60;
        implied.implied = true;
        assert!(implied.rank_score() < direct.rank_score());
    }
}
