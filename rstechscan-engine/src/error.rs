//! rstechscan-engine 内核错误定义
//! 封装规则编译阶段的所有错误，匹配与打分阶段不产生错误
use thiserror::Error;

use crate::core::MatchField;

/// 内核核心错误枚举
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================== 编译相关错误 =====================
    /// 正则编译失败，整库加载中止，不允许部分编译
    #[error("Invalid pattern in {tech}.{field}: {pattern:?}: {source}")]
    InvalidPattern {
        tech: String,
        field: MatchField,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 字段取值形态与字段定义不符
    #[error("Unexpected shape in {tech}.{field}: expected {expected}")]
    UnexpectedShape {
        tech: String,
        field: String,
        expected: &'static str,
    },

    // ===================== 规则文档错误 =====================
    /// 规则文档结构非法
    #[error("Invalid rule document: {0}")]
    InvalidDocument(String),

    /// JSON 解析失败
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 内核层全局Result类型别名
pub type CoreResult<T> = Result<T, CoreError>;
