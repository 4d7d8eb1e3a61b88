//! 规则加载：读取原始规则文档 → 编译 → 合并覆盖规则 → 缓存
use std::fmt;
use std::fs;
use std::sync::Arc;

use rstechscan_engine::{CategoryMap, CompileMode, RawRuleDocument, RawTech, RuleDatabase};

use crate::config::{OverlaySource, RuleConfig, RuleOrigin};
use crate::error::{ScanError, ScanResult};
use crate::rule::cache::RuleCacheManager;
use crate::rule::remote::RemoteRuleFetcher;

/// 单条技术编译前的处理钩子：(技术名, 原始定义, 分类表) → 新定义
pub type RawTechHook = Arc<dyn Fn(&str, RawTech, &CategoryMap) -> RawTech + Send + Sync>;

#[derive(Default, Clone)]
pub struct RuleLoader {
    hook: Option<RawTechHook>,
    remote_fetcher: RemoteRuleFetcher,
}

impl fmt::Debug for RuleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleLoader")
            .field("hook", &self.hook.is_some())
            .finish()
    }
}

impl RuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, RawTech, &CategoryMap) -> RawTech + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// 优先使用缓存；refresh 或缓存不可用时重新构建并写回缓存
    pub async fn load(&self, config: &RuleConfig) -> ScanResult<RuleDatabase> {
        if !config.options.refresh && config.cache_path().is_file() {
            match RuleCacheManager::load_from_cache(config) {
                Ok(db) => return Ok(db),
                Err(e) => tracing::warn!("规则缓存不可用，重新构建：{}", e),
            }
        }

        let db = self.build(config).await?;
        if let Err(e) = RuleCacheManager::save_to_cache(config, &db) {
            tracing::warn!("规则缓存写入失败：{}", e);
        }
        Ok(db)
    }

    /// 从规则源构建规则库（不读写缓存）
    pub async fn build(&self, config: &RuleConfig) -> ScanResult<RuleDatabase> {
        let primary = self.read_origin(config).await?;
        let db = self.compile(&primary, config)?;

        let Some(overlay) = &config.overlay else {
            return Ok(db);
        };
        let mut overlay_doc = Self::read_overlay(overlay)?;
        // 覆盖文档可只包含技术定义，分类沿用主文档
        for (id, category) in &primary.categories {
            overlay_doc
                .categories
                .entry(id.clone())
                .or_insert_with(|| category.clone());
        }
        let overlay_db = self.compile(&overlay_doc, config)?;
        tracing::info!("合并覆盖规则 {} 条", overlay_db.len());
        Ok(db.merge(&overlay_db))
    }

    fn compile(&self, doc: &RawRuleDocument, config: &RuleConfig) -> ScanResult<RuleDatabase> {
        let mode = if config.options.skip_invalid {
            CompileMode::SkipInvalid
        } else {
            CompileMode::Strict
        };
        let db = match &self.hook {
            Some(hook) => RuleDatabase::compile_with(doc, mode, |name, raw, cats| hook(name, raw, cats))?,
            None => RuleDatabase::compile_with(doc, mode, |_, raw, _| raw)?,
        };
        Ok(db)
    }

    async fn read_origin(&self, config: &RuleConfig) -> ScanResult<RawRuleDocument> {
        let doc = match &config.origin {
            RuleOrigin::LocalFile(path) => {
                let data = fs::read(path).map_err(|e| {
                    ScanError::RuleLoadError(format!("读取规则文件 {} 失败：{}", path.display(), e))
                })?;
                RawRuleDocument::from_slice(&data)?
            }
            RuleOrigin::Inline(json) => RawRuleDocument::from_json_str(json)?,
            RuleOrigin::Remote(url) => {
                let data = self.remote_fetcher.fetch(url, &config.remote_options).await?;
                RawRuleDocument::from_slice(&data)?
            }
        };
        tracing::debug!(
            "规则文档读取完成：{} 条技术，{} 个分类",
            doc.technologies.len(),
            doc.categories.len()
        );
        Ok(doc)
    }

    fn read_overlay(overlay: &OverlaySource) -> ScanResult<RawRuleDocument> {
        match overlay {
            OverlaySource::File(path) => {
                let data = fs::read(path)?;
                Ok(RawRuleDocument::from_slice(&data)?)
            }
            OverlaySource::Inline(json) => Ok(RawRuleDocument::from_json_str(json)?),
        }
    }
}
