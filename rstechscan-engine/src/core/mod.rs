mod enums;
mod evidence;
mod pattern;
mod result;
mod signature;
mod snapshot;

// 导出常用项
pub use enums::{EvidenceField, FieldShape, MatchField};
pub use evidence::Evidence;
pub use pattern::{build_case_insensitive, Pattern, PatternSpec, DEFAULT_CONFIDENCE};
pub use result::{DetectionResult, ResultSet, TechReport};
pub use signature::{
    FieldMatcher, KeyedPatterns, KeyedPatternsSpec, Relation, TechMeta, TechnologySignature,
    DEFAULT_ICON,
};
pub use snapshot::{AsCandidate, Candidate, JsGlobals, JsValue, MultiMap, PageSnapshot};
