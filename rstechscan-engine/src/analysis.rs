//! 单次分析流水线：匹配 → 汇总 → 关联推导 → 排序
//! 纯同步计算，无共享可变状态，规则库只读共享
use crate::core::{DetectionResult, PageSnapshot, TechReport};
use crate::database::RuleDatabase;
use crate::matching::MatchingEngine;
use crate::scoring::{aggregate, ImplicationResolver, Ranker};

pub fn analyze(db: &RuleDatabase, snapshot: &PageSnapshot) -> Vec<DetectionResult> {
    let evidence = MatchingEngine::collect_evidence(db, snapshot);
    log::debug!("Collected {} evidence entries", evidence.len());

    let mut results = aggregate(db, evidence);
    ImplicationResolver::new(db).resolve(&mut results);
    Ranker::finalize(results)
}

/// 分析并输出稳定的报告记录
pub fn analyze_report(db: &RuleDatabase, snapshot: &PageSnapshot) -> Vec<TechReport> {
    analyze(db, snapshot)
        .iter()
        .map(DetectionResult::to_report)
        .collect()
}
