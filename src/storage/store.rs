//! Key-value persistence seam.
//!
//! Detection history and performance baselines are persisted through the
//! `KeyValueStore` trait rather than a concrete backend, so the same code
//! runs against an in-memory map in tests and a directory of files in a
//! native deployment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by store backends.
///
/// These never escape the history/baseline layers: both catch them at the
/// operation boundary and degrade to a soft failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Minimal synchronous key-value storage contract.
///
/// Keys are short, well-known identifiers (`locale_detection_history`,
/// `performance-baselines`); values are JSON blobs serialized by the caller.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove the value stored under `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Short backend name reported in operation outcomes (e.g. "memory").
    fn name(&self) -> &'static str;
}

/// In-process store backed by a mutex-guarded map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored. Test helper.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// File-per-key store rooted at a directory.
///
/// The native analog of browser local storage: each key maps to
/// `<root>/<sanitized-key>.json`. Writes go through a temp file and rename
/// so a crash mid-write cannot leave a half-written blob behind.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            })
            .collect();
        self.root.join(format!("{}.json", sanitized))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

/// Outcome envelope for soft-failing storage operations.
///
/// History mutations never propagate errors to the caller; they report
/// success or failure here, together with where the data lives and how long
/// the operation took.
#[derive(Debug, Clone, Serialize)]
pub struct StoreOutcome<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    /// Backend name, e.g. "memory" or "file".
    pub source: &'static str,
    /// Unix epoch milliseconds at completion.
    pub timestamp: i64,
    pub response_time_ms: f64,
}

impl<T> StoreOutcome<T> {
    pub(crate) fn ok(data: T, source: &'static str, started: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            source,
            timestamp: Utc::now().timestamp_millis(),
            response_time_ms: as_millis(started.elapsed()),
        }
    }

    pub(crate) fn failed(error: String, source: &'static str, started: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            source,
            timestamp: Utc::now().timestamp_millis(),
            response_time_ms: as_millis(started.elapsed()),
        }
    }
}

fn as_millis(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
