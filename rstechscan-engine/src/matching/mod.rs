mod engine;
mod version;

pub use engine::MatchingEngine;
pub use version::resolve_version;
