mod pattern_compiler;
mod raw;
mod signature_compiler;

pub use pattern_compiler::{ParsedPattern, PatternCompiler};
pub use raw::{CategoryMap, RawCategory, RawRuleDocument, RawTech};
pub use signature_compiler::SignatureCompiler;
