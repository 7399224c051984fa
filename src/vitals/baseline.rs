//! Performance baseline persistence.
//!
//! Baselines are historical snapshots used as comparison points for
//! regression detection. They live in a bounded, append-only list persisted
//! as a JSON array: new entries go on the back, and the front is evicted
//! once the cap is exceeded, so the retained set is always the most recent
//! insertions in insertion order.
//!
//! Storage problems are caught and logged here, never surfaced to callers:
//! baseline bookkeeping must not break the page being measured.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::KeyValueStore;
use crate::vitals::metrics::DetailedWebVitals;

/// Storage key holding the serialized baseline list.
pub const BASELINES_KEY: &str = "performance-baselines";

/// Default bound on retained baselines.
pub const MAX_BASELINES: usize = 50;

/// Build metadata attached to a baseline when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

/// One persisted performance snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBaseline {
    /// Generated id: capture timestamp plus a random suffix.
    pub id: String,
    /// Unix epoch milliseconds at capture time.
    pub timestamp: i64,
    pub url: String,
    pub user_agent: String,
    pub connection: String,
    pub metrics: DetailedWebVitals,
    pub score: u32,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_info: Option<BuildInfo>,
}

/// Bounded baseline store over any [`KeyValueStore`] backend.
#[derive(Clone)]
pub struct BaselineStore<S: KeyValueStore> {
    store: S,
    max_baselines: usize,
    environment: String,
}

impl<S: KeyValueStore> BaselineStore<S> {
    pub fn new(store: S, environment: impl Into<String>) -> Self {
        Self {
            store,
            max_baselines: MAX_BASELINES,
            environment: environment.into(),
        }
    }

    /// Override the retained-baseline cap (default 50).
    pub fn with_capacity(mut self, max_baselines: usize) -> Self {
        self.max_baselines = max_baselines.max(1);
        self
    }

    /// Persist a new baseline built from `vitals`.
    ///
    /// Evicts the oldest entries once the cap is exceeded. Returns the
    /// stored record, or `None` when persisting failed; the failure is
    /// logged, not raised.
    pub fn save_baseline(
        &self,
        vitals: &DetailedWebVitals,
        url: &str,
        user_agent: &str,
        build_info: Option<BuildInfo>,
    ) -> Option<PerformanceBaseline> {
        let timestamp = Utc::now().timestamp_millis();
        let baseline = PerformanceBaseline {
            id: format!("{}-{}", timestamp, &Uuid::new_v4().simple().to_string()[..8]),
            timestamp,
            url: url.to_string(),
            user_agent: user_agent.to_string(),
            connection: vitals.connection.clone(),
            metrics: vitals.clone(),
            score: vitals.score(),
            environment: self.environment.clone(),
            build_info,
        };

        let mut baselines = self.load();
        baselines.push_back(baseline.clone());
        while baselines.len() > self.max_baselines {
            baselines.pop_front();
        }

        if self.persist(&baselines) {
            debug!(
                "saved baseline {} for {} (score {})",
                baseline.id, baseline.url, baseline.score
            );
            Some(baseline)
        } else {
            None
        }
    }

    /// All stored baselines, oldest first.
    pub fn get_baselines(&self) -> Vec<PerformanceBaseline> {
        self.load().into_iter().collect()
    }

    /// The most recent baseline matching `page` and/or `locale`.
    ///
    /// Matching is by substring on the stored URL: the page path directly,
    /// the locale as a `/{locale}/` path segment. With neither filter the
    /// most recent baseline overall is returned.
    pub fn get_recent_baseline(
        &self,
        page: Option<&str>,
        locale: Option<&str>,
    ) -> Option<PerformanceBaseline> {
        let locale_segment = locale.map(|l| format!("/{}/", l));
        self.load()
            .into_iter()
            .filter(|baseline| {
                let page_matches = page.map_or(true, |p| baseline.url.contains(p));
                let locale_matches = locale_segment
                    .as_ref()
                    .map_or(true, |segment| baseline.url.contains(segment.as_str()));
                page_matches && locale_matches
            })
            .last()
    }

    /// Remove baselines older than `max_age`.
    ///
    /// Returns the number removed; persists only when something changed.
    pub fn cleanup_old_baselines(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now().timestamp_millis() - max_age.as_millis() as i64;
        let mut baselines = self.load();
        let before = baselines.len();
        baselines.retain(|baseline| baseline.timestamp >= cutoff);
        let removed = before - baselines.len();

        if removed > 0 {
            self.persist(&baselines);
            debug!("removed {} stale baselines", removed);
        }
        removed
    }

    fn load(&self) -> VecDeque<PerformanceBaseline> {
        match self.store.get(BASELINES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(baselines) => baselines,
                Err(error) => {
                    warn!("discarding unreadable baseline list: {}", error);
                    VecDeque::new()
                }
            },
            Ok(None) => VecDeque::new(),
            Err(error) => {
                warn!("failed to read baselines: {}", error);
                VecDeque::new()
            }
        }
    }

    fn persist(&self, baselines: &VecDeque<PerformanceBaseline>) -> bool {
        let raw = match serde_json::to_string(baselines) {
            Ok(raw) => raw,
            Err(error) => {
                warn!("failed to serialize baselines: {}", error);
                return false;
            }
        };
        match self.store.set(BASELINES_KEY, &raw) {
            Ok(()) => true,
            Err(error) => {
                warn!("failed to write baselines: {}", error);
                false
            }
        }
    }
}
