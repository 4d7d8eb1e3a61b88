//! 检测模块：技术检测入口
pub mod detector;

pub use self::detector::TechDetector;
