pub mod rule;

pub use rule::{
    default_cache_path, CustomConfigBuilder, OverlaySource, RemoteOptions, RetryPolicy,
    RuleConfig, RuleOptions, RuleOrigin, DEFAULT_REMOTE_URL,
};
