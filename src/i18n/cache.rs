//! Translation cache.
//!
//! Caches loaded message bundles per locale for the lifetime of the
//! process. Bundles are loaded through an injected [`MessageLoader`] on
//! first request and served from memory afterwards. There is no TTL:
//! entries are invalidated only by [`TranslationCache::clear_cache`] or a
//! restart.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::i18n::messages::Messages;
use crate::i18n::metrics::{CacheMetrics, CacheMetricsReport};
use crate::i18n::registry::LocaleRegistry;

/// Why a messages request produced no bundle.
#[derive(Debug, Error)]
pub enum I18nError {
    #[error("locale code is empty")]
    EmptyLocale,

    #[error("unknown or disabled locale '{locale}': {reason}")]
    UnknownLocale { locale: String, reason: String },

    #[error("malformed message bundle for locale '{locale}': {detail}")]
    MalformedBundle { locale: String, detail: String },

    #[error("failed to load messages for locale '{locale}': {reason}")]
    LoadFailed { locale: String, reason: String },
}

/// Source of raw message bundles, typically backed by per-locale JSON files
/// or a translation service. Must reject unknown locales.
///
/// The loader returns a raw JSON value rather than a typed bundle so the
/// cache can classify a non-object payload as malformed instead of trusting
/// whatever the loader produced.
pub trait MessageLoader: Send + Sync {
    fn load(
        &self,
        locale: &str,
    ) -> impl Future<Output = anyhow::Result<serde_json::Value>> + Send;
}

/// A resolved bundle plus how it was obtained.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub messages: Arc<Messages>,
    /// True when served from memory without calling the loader.
    pub cache_used: bool,
    /// Loader latency for the entry (zero-ish for memory hits).
    pub load_time: Duration,
}

struct CacheEntry {
    messages: Arc<Messages>,
    #[allow(dead_code)]
    loaded_at: DateTime<Utc>,
    load_time: Duration,
}

/// Cache statistics exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of locales currently cached.
    pub size: usize,
}

/// Process-wide translation cache over an injected loader.
///
/// Explicitly constructed and passed where needed; not a module-level
/// singleton, so tests get isolated instances.
pub struct TranslationCache<L: MessageLoader> {
    loader: L,
    entries: Mutex<HashMap<String, CacheEntry>>,
    metrics: CacheMetrics,
}

impl<L: MessageLoader> TranslationCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: Mutex::new(HashMap::new()),
            metrics: CacheMetrics::new(),
        }
    }

    /// Fetch the bundle for `locale`, loading it on first request.
    ///
    /// The public contract: never panics and never returns an error. `None`
    /// means "no messages available" (empty locale, unknown locale,
    /// malformed bundle or loader failure) and the caller must not
    /// substitute another locale's data. The cause is logged and counted in
    /// the error metrics.
    pub async fn get_messages(&self, locale: &str) -> Option<Arc<Messages>> {
        match self.try_messages(locale).await {
            Ok(hit) => Some(hit.messages),
            Err(error) => {
                warn!("get_messages('{}') failed: {}", locale, error);
                None
            }
        }
    }

    /// Fetch the bundle for `locale` with the tagged failure cause.
    ///
    /// Used by the validator and the request resolver, which need to know
    /// *why* a bundle is unavailable.
    ///
    /// Concurrent first requests for the same uncached locale may each call
    /// the loader; the last insert wins. This mirrors the observed design,
    /// which does not de-duplicate in-flight loads.
    pub async fn try_messages(&self, locale: &str) -> Result<CacheHit, I18nError> {
        let locale = locale.trim();
        if locale.is_empty() {
            self.metrics.record_error(locale);
            return Err(I18nError::EmptyLocale);
        }

        if let Some(hit) = self.lookup(locale) {
            self.metrics.record_hit(locale);
            return Ok(hit);
        }

        let started = Instant::now();
        let raw = match self.loader.load(locale).await {
            Ok(raw) => raw,
            Err(error) => {
                self.metrics.record_error(locale);
                return Err(self.classify_load_failure(locale, error));
            }
        };

        let messages = match Messages::from_value(raw) {
            Ok(messages) => Arc::new(messages),
            Err(error) => {
                self.metrics.record_error(locale);
                return Err(I18nError::MalformedBundle {
                    locale: locale.to_string(),
                    detail: error.to_string(),
                });
            }
        };

        let load_time = started.elapsed();
        self.insert(locale, messages.clone(), load_time);
        self.metrics.record_miss(locale);
        debug!(
            "loaded messages for '{}' in {:.1}ms",
            locale,
            load_time.as_secs_f64() * 1000.0
        );

        Ok(CacheHit {
            messages,
            cache_used: false,
            load_time,
        })
    }

    /// Drop all cached bundles.
    pub fn clear_cache(&self) {
        self.entries.lock().unwrap().clear();
        debug!("translation cache cleared");
    }

    /// Current cache statistics.
    pub fn get_cache_stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.lock().unwrap().len(),
        }
    }

    /// Snapshot the usage metrics.
    pub fn get_metrics(&self) -> CacheMetricsReport {
        self.metrics.report()
    }

    /// Reset the usage metrics to zero. Cached bundles stay.
    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    fn lookup(&self, locale: &str) -> Option<CacheHit> {
        let entries = self.entries.lock().unwrap();
        entries.get(locale).map(|entry| CacheHit {
            messages: entry.messages.clone(),
            cache_used: true,
            load_time: entry.load_time,
        })
    }

    fn insert(&self, locale: &str, messages: Arc<Messages>, load_time: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            locale.to_string(),
            CacheEntry {
                messages,
                loaded_at: Utc::now(),
                load_time,
            },
        );
    }

    fn classify_load_failure(&self, locale: &str, error: anyhow::Error) -> I18nError {
        if LocaleRegistry::get().is_enabled(locale) {
            I18nError::LoadFailed {
                locale: locale.to_string(),
                reason: error.to_string(),
            }
        } else {
            I18nError::UnknownLocale {
                locale: locale.to_string(),
                reason: error.to_string(),
            }
        }
    }
}
