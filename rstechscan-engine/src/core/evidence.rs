use serde::Serialize;

use super::enums::EvidenceField;

/// 单条原始命中记录
/// 合成证据（implied/excluded）的 key 为引用方技术名
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub key: Option<String>,
    pub field: EvidenceField,
    pub tech_name: String,
    pub confidence: i64,
    pub version_template: String,
    pub resolved_version: String,
}

impl Evidence {
    /// 关联推导产生的合成证据，不携带版本
    pub fn synthetic(field: EvidenceField, referrer: &str, target: &str, confidence: i64) -> Self {
        Self {
            key: Some(referrer.to_string()),
            field,
            tech_name: target.to_string(),
            confidence,
            version_template: String::new(),
            resolved_version: String::new(),
        }
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.field.is_synthetic()
    }

    #[inline]
    pub fn has_version(&self) -> bool {
        !self.resolved_version.is_empty()
    }
}
