//! 快照模块：由原始 HTTP 素材构建 PageSnapshot
pub mod builder;
pub mod header_converter;
pub mod html_extractor;

pub use self::builder::{js_path, normalize_url, ScriptGlobals, SnapshotBuilder, StaticGlobals};
pub use self::header_converter::HeaderConverter;
pub use self::html_extractor::HtmlExtractor;
