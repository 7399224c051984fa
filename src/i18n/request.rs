//! Per-request locale configuration.
//!
//! Resolves whatever locale hint a request carries (a URL prefix, a
//! cookie, nothing at all) into a complete, always-usable context: a
//! supported locale, its message bundle, time zone and formatting presets,
//! plus load-time telemetry.
//!
//! This is the failure-containment boundary of the i18n layer: a broken or
//! missing bundle degrades to empty messages with an error flag, never to
//! a crashed render.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::warn;

use crate::i18n::cache::{MessageLoader, TranslationCache};
use crate::i18n::formats::FormatPresets;
use crate::i18n::locale::Locale;
use crate::i18n::messages::Messages;

/// Telemetry attached to every resolved request context.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RequestMetadata {
    /// Time spent obtaining the message bundle, in milliseconds.
    pub load_time_ms: f64,
    /// True when the bundle came from the cache without a loader call.
    pub cache_used: bool,
    /// Unix epoch milliseconds at resolution time.
    pub timestamp: i64,
    /// True when message loading failed and `messages` is the empty
    /// fallback bundle.
    pub error: bool,
}

/// Everything the rendering layer needs for one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub locale: Locale,
    pub messages: Arc<Messages>,
    pub time_zone: &'static str,
    pub formats: &'static FormatPresets,
    pub metadata: RequestMetadata,
}

/// Resolves request contexts against a shared translation cache.
pub struct RequestResolver<L: MessageLoader> {
    cache: Arc<TranslationCache<L>>,
}

impl<L: MessageLoader> RequestResolver<L> {
    pub fn new(cache: Arc<TranslationCache<L>>) -> Self {
        Self { cache }
    }

    /// Resolve a candidate locale into a full request context.
    ///
    /// Total over its input: `None`, empty strings and unsupported codes
    /// fall back to the default locale, and a failed bundle load produces
    /// empty messages with `metadata.error` set; the locale, time zone and
    /// formats are valid either way.
    pub async fn resolve(&self, requested: Option<&str>) -> RequestContext {
        let locale = Locale::resolve(requested);
        let started = Instant::now();

        let (messages, cache_used, error) = match self.cache.try_messages(locale.code()).await {
            Ok(hit) => (hit.messages, hit.cache_used, false),
            Err(cause) => {
                warn!(
                    "request config for '{}' falling back to empty messages: {}",
                    locale.code(),
                    cause
                );
                (Arc::new(Messages::empty()), false, true)
            }
        };

        RequestContext {
            locale,
            messages,
            time_zone: locale.time_zone(),
            formats: locale.formats(),
            metadata: RequestMetadata {
                load_time_ms: started.elapsed().as_secs_f64() * 1000.0,
                cache_used,
                timestamp: Utc::now().timestamp_millis(),
                error,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::{json, Value};

    struct FakeLoader {
        fail_all: bool,
    }

    impl MessageLoader for FakeLoader {
        async fn load(&self, locale: &str) -> anyhow::Result<Value> {
            if self.fail_all {
                bail!("loader offline");
            }
            match locale {
                "en" => Ok(json!({ "common": { "hello": "Hi" } })),
                "zh" => Ok(json!({ "common": { "hello": "你好" } })),
                other => bail!("no messages for locale '{}'", other),
            }
        }
    }

    fn resolver(fail_all: bool) -> RequestResolver<FakeLoader> {
        RequestResolver::new(Arc::new(TranslationCache::new(FakeLoader { fail_all })))
    }

    // ==================== Resolution Tests ====================

    #[tokio::test]
    async fn test_resolve_chinese() {
        let context = resolver(false).resolve(Some("zh")).await;

        assert_eq!(context.locale.code(), "zh");
        assert_eq!(context.time_zone, "Asia/Shanghai");
        assert_eq!(context.formats.number.currency.currency, "CNY");
        assert_eq!(context.messages.lookup("common.hello"), "你好");
        assert!(!context.metadata.error);
    }

    #[tokio::test]
    async fn test_resolve_default() {
        let context = resolver(false).resolve(Some("en")).await;
        assert_eq!(context.time_zone, "UTC");
        assert_eq!(context.formats.number.currency.currency, "USD");
    }

    // ==================== Fallback Tests ====================

    #[tokio::test]
    async fn test_unsupported_locale_falls_back_to_default() {
        let context = resolver(false).resolve(Some("xx-unsupported")).await;

        assert_eq!(context.locale.code(), "en");
        assert_eq!(context.time_zone, "UTC");
        assert_eq!(context.formats.number.currency.currency, "USD");
        assert!(!context.metadata.error);
    }

    #[tokio::test]
    async fn test_none_and_empty_inputs_never_fail() {
        let resolver = resolver(false);
        for candidate in [None, Some(""), Some("   ")] {
            let context = resolver.resolve(candidate).await;
            assert_eq!(context.locale.code(), "en");
            assert!(!context.time_zone.is_empty());
        }
    }

    #[tokio::test]
    async fn test_load_failure_produces_usable_fallback() {
        let context = resolver(true).resolve(Some("zh")).await;

        // Locale, time zone and formats survive the failed load
        assert_eq!(context.locale.code(), "zh");
        assert_eq!(context.time_zone, "Asia/Shanghai");
        assert_eq!(context.formats.number.currency.currency, "CNY");

        // Messages degrade to the empty bundle with the error flag set
        assert!(context.messages.is_empty());
        assert!(context.metadata.error);
        assert!(!context.metadata.cache_used);

        // Missing keys render as the key itself
        assert_eq!(context.messages.lookup("common.hello"), "common.hello");
    }

    // ==================== Metadata Tests ====================

    #[tokio::test]
    async fn test_metadata_reports_cache_usage() {
        let resolver = resolver(false);

        let first = resolver.resolve(Some("zh")).await;
        assert!(!first.metadata.cache_used);

        let second = resolver.resolve(Some("zh")).await;
        assert!(second.metadata.cache_used);
    }

    #[tokio::test]
    async fn test_metadata_timing_and_timestamp() {
        let before = Utc::now().timestamp_millis();
        let context = resolver(false).resolve(Some("en")).await;

        assert!(context.metadata.load_time_ms >= 0.0);
        assert!(context.metadata.timestamp >= before);
    }
}
