mod aggregator;
mod implication;
mod ranker;

pub use aggregator::{aggregate, boosted_confidence, collect_versions, ZERO_CONFIDENCE_BOOST};
pub use implication::ImplicationResolver;
pub use ranker::Ranker;
