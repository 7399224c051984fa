//! Integration tests for the pagepulse crate.
//!
//! These tests exercise the public surface across module boundaries: the
//! request resolver on top of the translation cache, the validator across
//! locales, and full monitoring cycles against in-memory and file-backed
//! stores.

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use proptest::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

use pagepulse::config::MonitoringConfig;
use pagepulse::i18n::{
    MessageLoader, RequestResolver, TranslationCache, TranslationValidator, ValidationIssue,
};
use pagepulse::storage::{FileStore, HistoryStore, LocaleDetectionRecord, MemoryStore};
use pagepulse::vitals::{
    BaselineStore, DetailedWebVitals, EntryKind, MonitoringManager, NavigationTiming,
    PerformanceEntry, SimulatedSource,
};

// ==================== Test Helpers ====================

/// Loader serving fixed bundles; anything else is rejected.
struct StaticLoader {
    en: Value,
    zh: Value,
}

impl StaticLoader {
    fn complete() -> Self {
        Self {
            en: json!({ "common": { "hello": "Hi", "bye": "Bye" } }),
            zh: json!({ "common": { "hello": "你好", "bye": "再见" } }),
        }
    }

    fn with_empty_zh() -> Self {
        Self {
            en: json!({ "common": { "hello": "Hi" } }),
            zh: json!({}),
        }
    }
}

impl MessageLoader for StaticLoader {
    async fn load(&self, locale: &str) -> anyhow::Result<Value> {
        match locale {
            "en" => Ok(self.en.clone()),
            "zh" => Ok(self.zh.clone()),
            other => bail!("no messages for locale '{}'", other),
        }
    }
}

fn good_vitals(page: &str) -> DetailedWebVitals {
    DetailedWebVitals {
        cls: Some(0.02),
        lcp: Some(1500.0),
        fid: Some(30.0),
        ..DetailedWebVitals::empty(page)
    }
}

fn test_config() -> MonitoringConfig {
    MonitoringConfig {
        cleanup_interval: Duration::ZERO,
        ..MonitoringConfig::default()
    }
}

// ==================== Detection History Scenarios ====================

#[test]
fn test_thirty_day_expiry_removes_exactly_the_old_record() {
    let store = HistoryStore::new(MemoryStore::new());
    let now = chrono::Utc::now().timestamp_millis();
    let day = 24 * 60 * 60 * 1000;

    store.record_detection(LocaleDetectionRecord {
        locale: "en".to_string(),
        source: "header".to_string(),
        timestamp: now - 31 * day,
        confidence: 0.8,
    });
    store.record_detection(LocaleDetectionRecord {
        locale: "zh".to_string(),
        source: "cookie".to_string(),
        timestamp: now - day,
        confidence: 1.0,
    });

    let outcome = store.cleanup_expired_detections(Duration::from_secs(30 * 24 * 60 * 60));
    assert!(outcome.success);
    assert_eq!(outcome.data, Some(1));

    let history = store.load_history().data.expect("history");
    assert_eq!(history.history.len(), 1);
    assert_eq!(history.history[0].locale, "zh");
}

// ==================== Validation Scenarios ====================

#[tokio::test]
async fn test_empty_chinese_bundle_fails_validation() {
    let cache = TranslationCache::new(StaticLoader::with_empty_zh());
    let result = TranslationValidator::new(&cache)
        .validate_translations()
        .await;

    assert!(!result.is_valid);
    assert!(
        result.issues.iter().any(|issue| issue.locale() == "zh"),
        "at least one issue must reference zh: {:?}",
        result.issues
    );
    assert!(result.coverage >= 0.0 && result.coverage <= 100.0);
}

#[tokio::test]
async fn test_complete_bundles_validate_cleanly() {
    let cache = TranslationCache::new(StaticLoader::complete());
    let result = TranslationValidator::new(&cache)
        .validate_translations()
        .await;

    assert!(result.is_valid);
    assert_eq!(result.coverage, 100.0);
    assert!(result.issues.is_empty());
}

#[tokio::test]
async fn test_validator_reuses_cached_bundles() {
    let cache = TranslationCache::new(StaticLoader::complete());
    cache.get_messages("en").await.expect("warm en");

    TranslationValidator::new(&cache)
        .validate_translations()
        .await;

    let report = cache.get_metrics();
    assert_eq!(report.hits, 1, "validation hit the warmed en entry");
    assert_eq!(report.usage_by_locale.get("zh"), Some(&1));
}

// ==================== Request Config Scenarios ====================

#[tokio::test]
async fn test_chinese_request_config() {
    let resolver = RequestResolver::new(Arc::new(TranslationCache::new(StaticLoader::complete())));
    let context = resolver.resolve(Some("zh")).await;

    assert_eq!(context.time_zone, "Asia/Shanghai");
    assert_eq!(context.formats.number.currency.currency, "CNY");
    assert_eq!(context.messages.lookup("common.hello"), "你好");
}

#[tokio::test]
async fn test_unsupported_request_falls_back_to_default() {
    let resolver = RequestResolver::new(Arc::new(TranslationCache::new(StaticLoader::complete())));
    let context = resolver.resolve(Some("xx-unsupported")).await;

    assert_eq!(context.locale.code(), "en");
    assert_eq!(context.time_zone, "UTC");
    assert_eq!(context.formats.number.currency.currency, "USD");
    assert!(!context.metadata.error);
}

#[tokio::test]
async fn test_concurrent_valid_and_invalid_loads() {
    let cache = Arc::new(TranslationCache::new(StaticLoader::complete()));
    let (en, invalid) = tokio::join!(cache.get_messages("en"), cache.get_messages("invalid"));

    assert!(en.is_some(), "the valid locale resolves");
    assert!(invalid.is_none(), "the invalid locale yields no messages");
    assert_eq!(cache.get_cache_stats().size, 1);
}

// ==================== Baseline Scenarios ====================

#[test]
fn test_fifty_one_saves_keep_the_newest_fifty() {
    let store = BaselineStore::new(MemoryStore::new(), "test");
    let mut ids = Vec::new();
    for i in 0..51 {
        let saved = store
            .save_baseline(&good_vitals("/en/"), &format!("/en/{}", i), "UA", None)
            .expect("save");
        ids.push(saved.id);
    }

    let baselines = store.get_baselines();
    assert_eq!(baselines.len(), 50);

    let earliest = ids.first().expect("first id");
    assert!(baselines.iter().all(|b| b.id != *earliest));
    // Retained entries are the last 50 insertions, in insertion order
    let stored_ids: Vec<&str> = baselines.iter().map(|b| b.id.as_str()).collect();
    let expected: Vec<&str> = ids[1..].iter().map(|id| id.as_str()).collect();
    assert_eq!(stored_ids, expected);
}

#[test]
fn test_baselines_survive_on_disk() {
    let dir = TempDir::new().expect("tempdir");
    {
        let store = BaselineStore::new(FileStore::new(dir.path()).expect("store"), "test");
        store.save_baseline(&good_vitals("/zh/about"), "https://site.test/zh/about", "UA", None);
    }

    let reopened = BaselineStore::new(FileStore::new(dir.path()).expect("store"), "test");
    let recent = reopened
        .get_recent_baseline(None, Some("zh"))
        .expect("persisted baseline");
    assert_eq!(recent.url, "https://site.test/zh/about");
}

// ==================== Full Monitoring Cycle ====================

#[tokio::test]
async fn test_full_cycle_against_file_store() {
    let dir = TempDir::new().expect("tempdir");
    let source = SimulatedSource::new();
    let manager = MonitoringManager::new(
        source.clone(),
        FileStore::new(dir.path()).expect("store"),
        test_config(),
    );
    manager.initialize();

    source.emit(
        EntryKind::LayoutShift,
        &[PerformanceEntry {
            value: 0.03,
            ..Default::default()
        }],
    );
    source.set_navigation_timing(NavigationTiming {
        ttfb: Some(250.0),
        dom_content_loaded: Some(800.0),
        load_complete: Some(1600.0),
        first_paint: Some(500.0),
    });

    let first = manager
        .perform_full_monitoring("https://site.test/zh/pricing", None)
        .await
        .expect("first cycle");
    assert!(first.baseline.is_none());
    assert!(first.report.contains("/zh/pricing"));

    let second = manager
        .perform_full_monitoring("https://site.test/zh/pricing", None)
        .await
        .expect("second cycle");
    assert!(second.baseline.is_some());
    assert!(!second.regression.expect("comparison ran").regressed);

    manager.shutdown();
}

#[tokio::test]
async fn test_cycles_for_different_pages_use_their_own_baselines() {
    let source = SimulatedSource::new();
    let manager = MonitoringManager::new(source.clone(), MemoryStore::new(), test_config());
    manager.initialize();

    manager
        .perform_full_monitoring("https://site.test/en/about", None)
        .await
        .expect("about cycle");
    let contact = manager
        .perform_full_monitoring("https://site.test/en/contact", None)
        .await
        .expect("contact cycle");

    // The contact page must not inherit the about page's baseline
    assert!(contact.baseline.is_none());
    assert_eq!(manager.baselines().get_baselines().len(), 2);
}

// ==================== Property Tests ====================

proptest! {
    /// The baseline cap holds for any sequence of saves and any cap.
    #[test]
    fn prop_baseline_cap_invariant(saves in 0usize..120, cap in 1usize..60) {
        let store = BaselineStore::new(MemoryStore::new(), "test").with_capacity(cap);
        for i in 0..saves {
            store.save_baseline(&good_vitals("/en/"), &format!("/en/{}", i), "UA", None);
        }
        let baselines = store.get_baselines();
        prop_assert!(baselines.len() <= cap);
        prop_assert_eq!(baselines.len(), saves.min(cap));
        // The retained suffix is the most recent insertions, still ordered
        for window in baselines.windows(2) {
            prop_assert!(window[0].timestamp <= window[1].timestamp);
        }
    }

    /// Coverage is always within [0, 100], and 100 on an exact key match.
    #[test]
    fn prop_coverage_bounds(
        keys in proptest::collection::btree_set("[a-z]{1,8}", 1..12),
        missing_mask in proptest::collection::vec(any::<bool>(), 12),
    ) {
        tokio_test::block_on(async {
            let en: serde_json::Map<String, Value> = keys
                .iter()
                .map(|k| (k.clone(), Value::String("text".to_string())))
                .collect();
            let zh: serde_json::Map<String, Value> = keys
                .iter()
                .zip(missing_mask.iter().chain(std::iter::repeat(&false)))
                .filter(|(_, missing)| !**missing)
                .map(|(k, _)| (k.clone(), Value::String("文本".to_string())))
                .collect();
            let full_match = en.len() == zh.len();

            struct Loader { en: Value, zh: Value }
            impl MessageLoader for Loader {
                async fn load(&self, locale: &str) -> anyhow::Result<Value> {
                    match locale {
                        "en" => Ok(self.en.clone()),
                        "zh" => Ok(self.zh.clone()),
                        other => bail!("no messages for '{}'", other),
                    }
                }
            }

            let cache = TranslationCache::new(Loader {
                en: Value::Object(en),
                zh: Value::Object(zh),
            });
            let result = TranslationValidator::new(&cache).validate_translations().await;

            prop_assert!(result.coverage >= 0.0 && result.coverage <= 100.0);
            if full_match {
                prop_assert_eq!(result.coverage, 100.0);
                prop_assert!(result.is_valid);
            }
            Ok(())
        })?;
    }

    /// The request resolver is total: any input yields a usable context.
    #[test]
    fn prop_resolver_never_fails(candidate in "\\PC*") {
        tokio_test::block_on(async {
            let resolver =
                RequestResolver::new(Arc::new(TranslationCache::new(StaticLoader::complete())));
            let context = resolver.resolve(Some(candidate.as_str())).await;

            prop_assert!(!context.locale.code().is_empty());
            prop_assert!(!context.time_zone.is_empty());
            prop_assert!(!context.formats.number.currency.currency.is_empty());
            Ok(())
        })?;
    }

    /// Duplicate cleanup is idempotent for any record multiset.
    #[test]
    fn prop_dedupe_idempotent(
        records in proptest::collection::vec((0i64..5, 0u8..3), 0..20)
    ) {
        let store = HistoryStore::new(MemoryStore::new());
        for (timestamp, locale_idx) in records {
            store.record_detection(LocaleDetectionRecord {
                locale: ["en", "zh", "de"][locale_idx as usize].to_string(),
                source: "cookie".to_string(),
                timestamp,
                confidence: 1.0,
            });
        }

        store.cleanup_duplicate_detections();
        let second = store.cleanup_duplicate_detections();
        prop_assert_eq!(second.data, Some(0));
    }
}

// ==================== Cross-Module Flow ====================

#[tokio::test]
async fn test_localized_page_flow() {
    // A zh visitor hits /zh/about: the request resolves, the page renders,
    // and the monitoring cycle records a baseline tagged with the locale.
    let resolver = RequestResolver::new(Arc::new(TranslationCache::new(StaticLoader::complete())));
    let context = resolver.resolve(Some("zh")).await;
    assert_eq!(context.messages.lookup("common.bye"), "再见");

    let source = SimulatedSource::new();
    let manager = MonitoringManager::new(source.clone(), MemoryStore::new(), test_config());
    manager.initialize();

    let outcome = manager
        .perform_full_monitoring("https://site.test/zh/about", None)
        .await
        .expect("cycle");
    assert_eq!(outcome.metrics.page, "/zh/about");

    let stored = manager
        .baselines()
        .get_recent_baseline(None, Some("zh"))
        .expect("locale-tagged baseline");
    assert!(stored.url.contains("/zh/"));
}

#[tokio::test]
async fn test_validation_issue_display_names_the_locale() {
    let cache = TranslationCache::new(StaticLoader::with_empty_zh());
    let result = TranslationValidator::new(&cache)
        .validate_translations()
        .await;

    let issue = result
        .issues
        .iter()
        .find(|issue| matches!(issue, ValidationIssue::EmptyBundle { .. }))
        .expect("empty bundle issue");
    assert!(issue.to_string().contains("zh"));
}
