//! implies / excludes 关联推导
use std::sync::Arc;

use crate::core::{DetectionResult, Evidence, EvidenceField, ResultSet};
use crate::database::RuleDatabase;

pub struct ImplicationResolver<'a> {
    db: &'a RuleDatabase,
}

impl<'a> ImplicationResolver<'a> {
    pub fn new(db: &'a RuleDatabase) -> Self {
        Self { db }
    }

    /// 仅遍历推导前已存在的结果；新建的推导结果不再向下传递
    pub fn resolve(&self, results: &mut ResultSet) {
        // 规则库无任何关联关系时直接跳过
        if !self.db.has_relations() {
            return;
        }

        let referrers: Vec<(String, Arc<_>)> = results
            .iter()
            .filter_map(|r| r.tech.as_ref().map(|t| (r.name.clone(), Arc::clone(t))))
            .filter(|(_, t)| t.has_relations())
            .collect();

        let mut pending = ResultSet::new();

        for (referrer, tech) in &referrers {
            for relation in &tech.implies {
                let evidence = Evidence::synthetic(
                    EvidenceField::Implied,
                    referrer,
                    &relation.target,
                    relation.confidence,
                );
                log::debug!(
                    "{} implies {} (confidence {})",
                    referrer,
                    relation.target,
                    relation.confidence
                );
                if let Some(existing) = results.get_mut(&relation.target) {
                    existing.evidence.push(evidence);
                    continue;
                }
                // 同一目标被多次推导时以最后一次为准，仅保留一条推导证据
                let mut created = DetectionResult::new(
                    relation.target.as_str(),
                    self.db.get(&relation.target).cloned(),
                );
                created.implied = true;
                created.confidence = relation.confidence;
                created.evidence.push(evidence);
                pending.replace(created);
            }

            for relation in &tech.excludes {
                let Some(existing) = results.get_mut(&relation.target) else {
                    continue;
                };
                log::debug!(
                    "{} excludes {} (confidence {})",
                    referrer,
                    relation.target,
                    relation.confidence
                );
                existing.evidence.push(Evidence::synthetic(
                    EvidenceField::Excluded,
                    referrer,
                    &relation.target,
                    relation.confidence,
                ));
            }
        }

        for created in pending.into_vec() {
            results.insert(created);
        }
    }
}
