//! Locale detection history.
//!
//! Every locale detection (URL prefix, cookie, Accept-Language header,
//! browser setting) appends an immutable record to a bounded, newest-first
//! history persisted as a single JSON blob. The store offers the cleanup
//! and compaction operations the detection layer runs opportunistically:
//! expire-by-age, dedupe, cap-by-count and full reset.
//!
//! All mutating operations fail softly: storage errors are caught at this
//! boundary and reported through [`StoreOutcome`], never thrown past it.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::store::{KeyValueStore, StoreOutcome};

/// Storage key holding the serialized [`DetectionHistory`].
pub const HISTORY_KEY: &str = "locale_detection_history";

/// Default bound on the number of retained detection records.
pub const DEFAULT_HISTORY_CAP: usize = 100;

/// Default expiry horizon for detection records (30 days).
pub const DEFAULT_DETECTION_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// One locale detection event. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocaleDetectionRecord {
    /// Detected locale code (e.g. "en", "zh").
    pub locale: String,
    /// Where the detection came from (e.g. "url", "cookie", "header").
    pub source: String,
    /// Unix epoch milliseconds at detection time.
    pub timestamp: i64,
    /// Detection confidence in `[0.0, 1.0]`.
    pub confidence: f64,
}

impl LocaleDetectionRecord {
    /// Build a record stamped with the current time.
    pub fn new(locale: impl Into<String>, source: impl Into<String>, confidence: f64) -> Self {
        Self {
            locale: locale.into(),
            source: source.into(),
            timestamp: Utc::now().timestamp_millis(),
            confidence,
        }
    }

    /// Composite identity used by duplicate cleanup.
    fn dedupe_key(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.locale, self.source, self.timestamp, self.confidence
        )
    }
}

/// The persisted history blob.
///
/// Invariant: `history` is sorted newest-first after every mutation and its
/// length never exceeds the configured cap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionHistory {
    pub history: Vec<LocaleDetectionRecord>,
    /// Unix epoch milliseconds of the last mutation.
    pub last_updated: i64,
}

/// Bounded detection-history store over any [`KeyValueStore`] backend.
pub struct HistoryStore<S: KeyValueStore> {
    store: S,
    cap: usize,
}

impl<S: KeyValueStore> HistoryStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cap: DEFAULT_HISTORY_CAP,
        }
    }

    /// Override the retained-record cap (default 100).
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap.max(1);
        self
    }

    /// Append a detection record, keeping newest-first order and the cap.
    ///
    /// Returns the number of records retained after the append.
    pub fn record_detection(&self, record: LocaleDetectionRecord) -> StoreOutcome<usize> {
        let cap = self.cap;
        self.mutate("record_detection", move |history| {
            let position = history
                .history
                .iter()
                .position(|r| r.timestamp <= record.timestamp)
                .unwrap_or(history.history.len());
            history.history.insert(position, record);
            history.history.truncate(cap);
            history.history.len()
        })
    }

    /// Remove records older than `max_age`.
    ///
    /// Returns the number removed; a history with nothing expired is a
    /// successful no-op reporting zero.
    pub fn cleanup_expired_detections(&self, max_age: Duration) -> StoreOutcome<usize> {
        let cutoff = Utc::now().timestamp_millis() - max_age.as_millis() as i64;
        self.mutate("cleanup_expired_detections", move |history| {
            let before = history.history.len();
            history.history.retain(|r| r.timestamp >= cutoff);
            before - history.history.len()
        })
    }

    /// Remove records whose `locale-source-timestamp-confidence` identity has
    /// already been seen, preserving first occurrences in order.
    ///
    /// Returns the number removed. Running it twice in a row removes zero the
    /// second time.
    pub fn cleanup_duplicate_detections(&self) -> StoreOutcome<usize> {
        self.mutate("cleanup_duplicate_detections", |history| {
            let before = history.history.len();
            let mut seen = HashSet::with_capacity(before);
            history.history.retain(|r| seen.insert(r.dedupe_key()));
            before - history.history.len()
        })
    }

    /// Truncate to the newest `max_records` entries.
    ///
    /// Returns the number removed.
    pub fn limit_history_size(&self, max_records: usize) -> StoreOutcome<usize> {
        self.mutate("limit_history_size", move |history| {
            let before = history.history.len();
            history.history.truncate(max_records);
            before - history.history.len()
        })
    }

    /// Reset to a fresh, empty history structure.
    pub fn clear_all_history(&self) -> StoreOutcome<()> {
        self.mutate("clear_all_history", |history| {
            history.history.clear();
        })
    }

    /// Read the current history without mutating it.
    pub fn load_history(&self) -> StoreOutcome<DetectionHistory> {
        let started = Instant::now();
        match self.read() {
            Ok(history) => StoreOutcome::ok(history, self.store.name(), started),
            Err(error) => {
                warn!("load_history failed: {}", error);
                StoreOutcome::failed(error, self.store.name(), started)
            }
        }
    }

    /// Read-modify-write-persist with the soft-failure envelope.
    ///
    /// The closure mutates the decoded history and returns the operation's
    /// result value. After it runs, newest-first ordering is re-established
    /// and `last_updated` is stamped before persisting.
    fn mutate<T>(
        &self,
        operation: &str,
        apply: impl FnOnce(&mut DetectionHistory) -> T,
    ) -> StoreOutcome<T> {
        let started = Instant::now();
        let result = self.read().and_then(|mut history| {
            let value = apply(&mut history);
            history
                .history
                .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            history.last_updated = Utc::now().timestamp_millis();
            self.persist(&history)?;
            Ok(value)
        });

        match result {
            Ok(value) => {
                debug!("{} completed", operation);
                StoreOutcome::ok(value, self.store.name(), started)
            }
            Err(error) => {
                warn!("{} failed: {}", operation, error);
                StoreOutcome::failed(error, self.store.name(), started)
            }
        }
    }

    fn read(&self) -> Result<DetectionHistory, String> {
        let blob = self
            .store
            .get(HISTORY_KEY)
            .map_err(|e| format!("read failed: {}", e))?;
        match blob {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| format!("parse failed: {}", e)),
            None => Ok(DetectionHistory::default()),
        }
    }

    fn persist(&self, history: &DetectionHistory) -> Result<(), String> {
        let raw =
            serde_json::to_string(history).map_err(|e| format!("serialize failed: {}", e))?;
        self.store
            .set(HISTORY_KEY, &raw)
            .map_err(|e| format!("write failed: {}", e))
    }
}
