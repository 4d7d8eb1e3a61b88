//! 第一轮汇总：按技术分组证据，计算加成置信度并收集版本
use crate::core::{DetectionResult, Evidence, ResultSet};
use crate::database::RuleDatabase;

/// 每条零置信度证据的加成（仅在存在正置信度证据时生效）
pub const ZERO_CONFIDENCE_BOOST: i64 = 25;

/// 加成置信度：合成证据不计入基础分与计数，累加饱和于 i64 边界
pub fn boosted_confidence(evidence: &[Evidence]) -> i64 {
    let mut base = 0i64;
    let mut zero = 0i64;
    let mut positive = 0i64;
    for e in evidence.iter().filter(|e| !e.is_synthetic()) {
        base = base.saturating_add(e.confidence);
        if e.confidence == 0 {
            zero += 1;
        } else if e.confidence > 0 {
            positive += 1;
        }
    }
    let boost = if positive > 0 {
        ZERO_CONFIDENCE_BOOST.saturating_mul(zero)
    } else {
        0
    };
    base.saturating_add(boost)
}

/// 按证据顺序收集非空版本，保留重复
pub fn collect_versions(evidence: &[Evidence]) -> Vec<String> {
    evidence
        .iter()
        .filter(|e| e.has_version())
        .map(|e| e.resolved_version.clone())
        .collect()
}

/// 证据 → 结果集（按技术首次出现顺序）
pub fn aggregate(db: &RuleDatabase, evidence: Vec<Evidence>) -> ResultSet {
    let mut results = ResultSet::new();
    for e in evidence {
        let name = e.tech_name.clone();
        results
            .entry_or_insert_with(&name, || {
                DetectionResult::new(name.as_str(), db.get(&name).cloned())
            })
            .evidence
            .push(e);
    }
    for result in results.iter_mut() {
        result.confidence = boosted_confidence(&result.evidence);
        result.versions = collect_versions(&result.evidence);
    }
    results
}
