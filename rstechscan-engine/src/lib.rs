// 核心公共结构体+枚举
pub mod core;
// 模式/技术定义编译
pub mod compiler;
// 编译后的只读规则库
pub mod database;
// 证据匹配 + 版本模板解析
pub mod matching;
// 置信度汇总、关联推导、排序
pub mod scoring;
// 单次分析流水线
pub mod analysis;
pub mod error;
mod utils;

// 顶层导出常用类型
pub use analysis::{analyze, analyze_report};
pub use compiler::{CategoryMap, PatternCompiler, RawRuleDocument, RawTech, SignatureCompiler};
pub use core::{
    DetectionResult, Evidence, EvidenceField, FieldMatcher, JsGlobals, JsValue, MatchField,
    MultiMap, PageSnapshot, Pattern, Relation, TechMeta, TechReport, TechnologySignature,
};
pub use database::{CompileMode, RuleDatabase};
pub use error::{CoreError, CoreResult};
pub use utils::slugify;
