//! Translation cache metrics.
//!
//! Tracks cache hits, misses, load errors and per-locale usage. Owned by
//! the cache that produces the numbers rather than living in a process
//! global, so parallel caches (and parallel tests) never bleed into each
//! other.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::Serialize;

/// Counters for one translation cache.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Requests served from memory
    hits: AtomicUsize,

    /// Requests that triggered a loader call which succeeded
    misses: AtomicUsize,

    /// Requests that failed (empty locale, unknown locale, malformed
    /// bundle, loader failure)
    errors: AtomicUsize,

    /// Per-locale request counts
    usage: Mutex<BTreeMap<String, u64>>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self, locale: &str) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.bump_usage(locale);
    }

    pub(crate) fn record_miss(&self, locale: &str) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        self.bump_usage(locale);
    }

    pub(crate) fn record_error(&self, locale: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        if !locale.is_empty() {
            self.bump_usage(locale);
        }
    }

    fn bump_usage(&self, locale: &str) {
        if let Ok(mut usage) = self.usage.lock() {
            *usage.entry(locale.to_string()).or_insert(0) += 1;
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Total requests observed: hits + misses + errors.
    pub fn attempts(&self) -> usize {
        self.hits() + self.misses() + self.errors()
    }

    /// Snapshot the counters into a report.
    pub fn report(&self) -> CacheMetricsReport {
        let hits = self.hits();
        let misses = self.misses();
        let errors = self.errors();
        let attempts = hits + misses + errors;

        let error_rate = if attempts > 0 {
            (errors as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            (hits as f64 / lookups as f64) * 100.0
        } else {
            0.0
        };

        let usage_by_locale = self
            .usage
            .lock()
            .map(|usage| usage.clone())
            .unwrap_or_default();

        CacheMetricsReport {
            hits,
            misses,
            errors,
            attempts,
            hit_rate,
            error_rate,
            usage_by_locale,
        }
    }

    /// Reset every counter to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        if let Ok(mut usage) = self.usage.lock() {
            usage.clear();
        }
    }
}

/// Point-in-time metrics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheMetricsReport {
    pub hits: usize,
    pub misses: usize,
    pub errors: usize,
    pub attempts: usize,

    /// Hits as a percentage of successful lookups (0-100)
    pub hit_rate: f64,

    /// Errors as a percentage of all attempts (0-100)
    pub error_rate: f64,

    pub usage_by_locale: BTreeMap<String, u64>,
}
