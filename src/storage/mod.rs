//! Persistence layer: the key-value store seam and the locale detection
//! history that lives on top of it.

mod history;
mod store;

pub use history::{
    DetectionHistory, HistoryStore, LocaleDetectionRecord, DEFAULT_DETECTION_MAX_AGE,
    DEFAULT_HISTORY_CAP, HISTORY_KEY,
};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError, StoreOutcome};
