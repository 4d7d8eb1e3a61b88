//! 编译结果缓存：规则库以 {技术名 → 签名} JSON 形式落盘
use std::fs;

use rstechscan_engine::RuleDatabase;

use crate::config::RuleConfig;
use crate::error::{ScanError, ScanResult};

/// 规则缓存管理器
pub struct RuleCacheManager;

impl RuleCacheManager {
    pub fn load_from_cache(config: &RuleConfig) -> ScanResult<RuleDatabase> {
        let path = config.cache_path();
        let data = fs::read(path)?;
        let db: RuleDatabase = serde_json::from_slice(&data).map_err(|e| {
            ScanError::RuleCacheError(format!("缓存文件 {} 解析失败：{}", path.display(), e))
        })?;
        tracing::debug!("从缓存加载 {} 条技术规则：{}", db.len(), path.display());
        Ok(db)
    }

    pub fn save_to_cache(config: &RuleConfig, db: &RuleDatabase) -> ScanResult<()> {
        let path = config.cache_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec(db)?;
        fs::write(path, data)?;
        tracing::debug!("规则缓存已写入：{}", path.display());
        Ok(())
    }

    /// 删除缓存文件，不存在时视为成功
    pub fn clear_cache(config: &RuleConfig) -> ScanResult<()> {
        match fs::remove_file(config.cache_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
