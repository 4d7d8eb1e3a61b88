use std::fs;
use std::path::PathBuf;

use http::header::HeaderMap;
use rstechscan::{
    CustomConfigBuilder, OverlaySource, PageSnapshot, RuleCacheManager, RuleConfig, RuleLoader,
    RuleOrigin, TechDetector,
};

const RULES: &str = r#"{
    "categories": {"1": {"name": "Web servers", "priority": 8}},
    "technologies": {
        "Nginx": {"cats": [1], "headers": {"server": "nginx(?:/([\\d.]+))?\\;version:\\1"}, "cpe": "cpe:2.3:a:f5:nginx:*:*:*:*:*:*:*:*"},
        "Apache": {"cats": [1], "headers": {"server": "apache"}}
    }
}"#;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("rstechscan-test-{}", std::process::id()))
        .join(name)
}

fn config(cache: &PathBuf, origin: RuleOrigin) -> RuleConfig {
    CustomConfigBuilder::new()
        .origin(origin)
        .cache_path(cache.clone())
        .build()
}

#[tokio::test]
async fn test_load_writes_and_reuses_cache() {
    // 测试场景：首次加载写入缓存，第二次即使规则源失效也从缓存读取
    init_logging();
    let cache = temp_path("reuse/technologies.json");
    let _ = fs::remove_file(&cache);

    let first = RuleLoader::new()
        .load(&config(&cache, RuleOrigin::Inline(RULES.to_string())))
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    assert!(cache.is_file());

    let missing = RuleOrigin::LocalFile(temp_path("does-not-exist.json"));
    let second = RuleLoader::new().load(&config(&cache, missing)).await.unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(
        second.get("Nginx").unwrap().meta.cpe.as_deref(),
        Some("cpe:2.3:a:f5:nginx:*:*:*:*:*:*:*:*")
    );

    RuleCacheManager::clear_cache(&config(&cache, RuleOrigin::Inline(String::new()))).unwrap();
    assert!(!cache.exists());
}

#[tokio::test]
async fn test_refresh_ignores_cache() {
    init_logging();
    let cache = temp_path("refresh/technologies.json");
    let _ = fs::remove_file(&cache);

    RuleLoader::new()
        .load(&config(&cache, RuleOrigin::Inline(RULES.to_string())))
        .await
        .unwrap();

    let smaller = r#"{"technologies": {"Caddy": {"headers": {"server": "caddy"}}}}"#;
    let refreshed = CustomConfigBuilder::new()
        .origin(RuleOrigin::Inline(smaller.to_string()))
        .cache_path(cache.clone())
        .refresh(true)
        .build();
    let db = RuleLoader::new().load(&refreshed).await.unwrap();
    assert_eq!(db.len(), 1);
    assert!(db.get("Caddy").is_some());

    // 缓存已被新结果覆盖
    let cached = RuleCacheManager::load_from_cache(&refreshed).unwrap();
    assert_eq!(cached.len(), 1);
    RuleCacheManager::clear_cache(&refreshed).unwrap();
}

#[tokio::test]
async fn test_overlay_file_and_detection() {
    init_logging();
    let rules_path = temp_path("overlay/rules.json");
    let ours_path = temp_path("overlay/ours.json");
    fs::create_dir_all(rules_path.parent().unwrap()).unwrap();
    fs::write(&rules_path, RULES).unwrap();
    fs::write(
        &ours_path,
        r#"{"technologies": {"Apache": {"cats": [1], "headers": {"server": "apache/([\\d.]+)\\;version:\\1\\;confidence:50"}}}}"#,
    )
    .unwrap();

    let config = CustomConfigBuilder::new()
        .origin(RuleOrigin::LocalFile(rules_path.clone()))
        .overlay(OverlaySource::detect(ours_path.to_str().unwrap()))
        .cache_path(temp_path("overlay/cache.json"))
        .refresh(true)
        .build();
    let detector = TechDetector::new(config.clone()).await.unwrap();

    let mut headers = HeaderMap::new();
    headers.insert("server", "Apache/2.4.57 (Debian)".parse().unwrap());
    let reports = detector.detect_report("example.org", &headers, b"").unwrap();

    assert_eq!(reports.len(), 1);
    let apache = &reports[0];
    assert_eq!(apache.name, "Apache");
    assert_eq!(apache.confidence, 50);
    assert_eq!(apache.best_version.as_deref(), Some("2.4.57"));
    assert_eq!(apache.categories.as_deref(), Some(&["Web servers".to_string()][..]));

    RuleCacheManager::clear_cache(&config).unwrap();
}

#[tokio::test]
async fn test_snapshot_json_roundtrip_through_detector() {
    // 测试场景：外部采集器输出的快照 JSON 直接参与分析
    let db = RuleLoader::new()
        .build(&RuleConfig::inline(RULES))
        .await
        .unwrap();
    let detector = TechDetector::with_database(db);

    let snapshot: PageSnapshot = serde_json::from_str(
        r#"{"url": "https://example.org/", "headers": {"server": ["nginx/1.25.3"]}}"#,
    )
    .unwrap();
    let results = detector.analyze(&snapshot);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].best_version.as_deref(), Some("1.25.3"));
}
