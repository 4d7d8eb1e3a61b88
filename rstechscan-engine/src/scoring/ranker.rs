//! 最终处理：重算置信度、关联修正、最佳版本选择与排序
use rustc_hash::FxHashMap;

use super::aggregator::boosted_confidence;
use crate::core::{DetectionResult, Evidence, EvidenceField, MatchField, ResultSet};

pub struct Ranker;

impl Ranker {
    pub fn finalize(mut results: ResultSet) -> Vec<DetectionResult> {
        // 1. 基于完整证据重算加成置信度
        for result in results.iter_mut() {
            result.confidence = boosted_confidence(&result.evidence);
        }

        // 2. 关联修正，引用方置信度取第 1 步结果
        let base: FxHashMap<String, i64> = results
            .iter()
            .map(|r| (r.name.clone(), r.confidence))
            .collect();
        for result in results.iter_mut() {
            let implied = result
                .evidence
                .iter()
                .find(|e| e.field == EvidenceField::Implied)
                .and_then(|e| Self::referred_weight(e, &base));
            let excluded = result
                .evidence
                .iter()
                .filter(|e| e.field == EvidenceField::Excluded)
                .find_map(|e| Self::referred_weight(e, &base));
            result.confidence = result
                .confidence
                .saturating_add(implied.unwrap_or(0))
                .saturating_sub(excluded.unwrap_or(0));
        }

        // 3. 最佳版本
        for result in results.iter_mut() {
            result.best_version = Self::best_version(&result.evidence);
        }

        // 4. 稳定降序排序
        let mut ranked = results.into_vec();
        ranked.sort_by(|a, b| b.rank_score().total_cmp(&a.rank_score()));
        ranked
    }

    /// floor(证据置信度 × 引用方置信度 / 100)，引用方已不在结果集中时返回 None
    fn referred_weight(evidence: &Evidence, base: &FxHashMap<String, i64>) -> Option<i64> {
        let referrer = evidence.key.as_deref()?;
        let referred = base.get(referrer)?;
        Some(evidence.confidence.saturating_mul(*referred).div_euclid(100))
    }

    /// 版本投票：累计置信度唯一最高 → 出现次数唯一最高 → 仅 js → 仅 scripts → 首个版本
    pub fn best_version(evidence: &[Evidence]) -> Option<String> {
        let versioned: Vec<&Evidence> = evidence.iter().filter(|e| e.has_version()).collect();

        if let Some(version) = Self::vote(&versioned) {
            return Some(version);
        }
        for field in [MatchField::Js, MatchField::Scripts] {
            let restricted: Vec<&Evidence> = versioned
                .iter()
                .copied()
                .filter(|e| e.field == EvidenceField::Matched(field))
                .collect();
            if let Some(version) = Self::vote(&restricted) {
                return Some(version);
            }
        }
        versioned.first().map(|e| e.resolved_version.clone())
    }

    fn vote(evidence: &[&Evidence]) -> Option<String> {
        // (版本, 累计置信度, 次数)，保持首次出现顺序
        let mut groups: Vec<(&str, i64, usize)> = Vec::new();
        for e in evidence {
            match groups.iter_mut().find(|(v, _, _)| *v == e.resolved_version) {
                Some(group) => {
                    group.1 = group.1.saturating_add(e.confidence);
                    group.2 += 1;
                }
                None => groups.push((e.resolved_version.as_str(), e.confidence, 1)),
            }
        }

        Self::unique_max(&groups, |g| g.1 as i128)
            .or_else(|| Self::unique_max(&groups, |g| g.2 as i128))
            .map(str::to_string)
    }

    fn unique_max<'g>(
        groups: &[(&'g str, i64, usize)],
        score: impl Fn(&(&'g str, i64, usize)) -> i128,
    ) -> Option<&'g str> {
        let max = groups.iter().map(&score).max()?;
        let mut top = groups.iter().filter(|g| score(*g) == max);
        match (top.next(), top.next()) {
            (Some(winner), None) => Some(winner.0),
            _ => None,
        }
    }
}
