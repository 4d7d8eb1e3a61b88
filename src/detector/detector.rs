//! Tech detector core module
//! 技术检测器核心
//! 核心职责：
//! 1. 规则库加载（本地/内联/远程规则，带缓存）
//! 2. 由 URL、响应头、响应体构建页面快照
//! 3. 调用引擎完成匹配、打分、关联推导与排序

use std::sync::Arc;
use std::time::Instant;

use http::header::HeaderMap;
use rstechscan_engine::{DetectionResult, PageSnapshot, RuleDatabase, TechReport};

use crate::config::RuleConfig;
use crate::error::ScanResult;
use crate::rule::RuleLoader;
use crate::snapshot::{ScriptGlobals, SnapshotBuilder};

/// 技术检测器
/// 规则库构建后只读，Arc 共享，各次检测互不影响
#[derive(Debug, Clone)]
pub struct TechDetector {
    db: Arc<RuleDatabase>,
}

impl TechDetector {
    /// 按配置加载规则库（优先缓存）并创建检测器
    pub async fn new(config: RuleConfig) -> ScanResult<Self> {
        Self::with_loader(&RuleLoader::new(), &config).await
    }

    /// 使用自定义加载器（如带 RawTechHook）创建检测器
    pub async fn with_loader(loader: &RuleLoader, config: &RuleConfig) -> ScanResult<Self> {
        let start = Instant::now();
        let db = loader.load(config).await?;
        tracing::info!("规则库加载完成：{} 条技术，耗时 {:?}", db.len(), start.elapsed());
        Ok(Self::with_database(db))
    }

    /// 使用已编译的规则库创建检测器
    pub fn with_database(db: RuleDatabase) -> Self {
        Self { db: Arc::new(db) }
    }

    pub fn database(&self) -> &RuleDatabase {
        &self.db
    }

    /// 直接分析已构建的页面快照
    pub fn analyze(&self, snapshot: &PageSnapshot) -> Vec<DetectionResult> {
        let start = Instant::now();
        let results = self.db.analyze(snapshot);
        tracing::debug!("检测完成：{} 项技术，耗时 {:?}", results.len(), start.elapsed());
        results
    }

    /// 基于 URL、响应头、响应体检测（不含 js 全局变量）
    pub fn detect(&self, url: &str, headers: &HeaderMap, body: &[u8]) -> ScanResult<Vec<DetectionResult>> {
        let snapshot = Self::snapshot_builder(url, headers, body)?.build();
        Ok(self.analyze(&snapshot))
    }

    /// 同 `detect`，额外对规则声明的 js 变量求值
    pub async fn detect_with_globals(
        &self,
        url: &str,
        headers: &HeaderMap,
        body: &[u8],
        globals: &dyn ScriptGlobals,
    ) -> ScanResult<Vec<DetectionResult>> {
        let snapshot = Self::snapshot_builder(url, headers, body)?
            .collect_js(&self.db, globals)
            .await
            .build();
        Ok(self.analyze(&snapshot))
    }

    /// 检测并输出报告记录
    pub fn detect_report(&self, url: &str, headers: &HeaderMap, body: &[u8]) -> ScanResult<Vec<TechReport>> {
        Ok(self
            .detect(url, headers, body)?
            .iter()
            .map(DetectionResult::to_report)
            .collect())
    }

    fn snapshot_builder(url: &str, headers: &HeaderMap, body: &[u8]) -> ScanResult<SnapshotBuilder> {
        let html = String::from_utf8_lossy(body);
        Ok(SnapshotBuilder::new(url)?.headers(headers).html(html.into_owned()))
    }
}
