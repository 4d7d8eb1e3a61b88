//! rstechscan - 网站技术栈识别库
//! 规则加载、页面快照构建与检测入口，匹配打分由 rstechscan-engine 完成

pub mod config;
pub mod detector;
pub mod error;
pub mod rule;
pub mod snapshot;

// 导出全局错误类型
pub use self::error::{ScanError, ScanResult};

// 导出配置模块核心结构体与构建器
pub use crate::config::{
    default_cache_path, CustomConfigBuilder, OverlaySource, RemoteOptions, RetryPolicy,
    RuleConfig, RuleOptions, RuleOrigin, DEFAULT_REMOTE_URL,
};

// 导出规则加载与缓存
pub use crate::rule::{RawTechHook, RemoteRuleFetcher, RuleCacheManager, RuleLoader};

// 导出快照构建工具
pub use crate::snapshot::{
    normalize_url, HeaderConverter, HtmlExtractor, ScriptGlobals, SnapshotBuilder, StaticGlobals,
};

// 导出检测入口
pub use crate::detector::TechDetector;

// 导出引擎核心类型
pub use rstechscan_engine::{
    analyze, analyze_report, CategoryMap, CompileMode, CoreError, DetectionResult, Evidence,
    EvidenceField, JsValue, MatchField, PageSnapshot, RawRuleDocument, RawTech, RuleDatabase,
    TechReport, TechnologySignature,
};
