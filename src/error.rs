//! 全局错误类型定义
use rstechscan_engine::CoreError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;
use url::ParseError as UrlParseError;

#[derive(Error, Debug)]
pub enum ScanError {
    // 规则相关错误
    #[error("规则加载失败：{0}")]
    RuleLoadError(String),
    #[error("规则编译失败：{0}")]
    RuleCompileError(#[from] CoreError),
    #[error("规则缓存失败：{0}")]
    RuleCacheError(String),

    // 网络相关错误
    #[cfg(feature = "remote-loader")]
    #[error("网络请求失败：{0}")]
    NetworkError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
    #[error("无效输入：{0}")]
    InvalidInput(String),
    #[error("功能未启用：{0}")]
    FeatureDisabled(String),
}

// 全局Result类型
pub type ScanResult<T> = Result<T, ScanError>;
