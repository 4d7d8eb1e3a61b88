//! 规则模块：负责规则的读取、编译、覆盖合并与缓存
pub mod cache;
pub mod loader;
pub mod remote;

pub use self::cache::RuleCacheManager;
pub use self::loader::{RawTechHook, RuleLoader};
pub use self::remote::RemoteRuleFetcher;
