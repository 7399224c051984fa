//! pagepulse: locale-aware request configuration and web-vitals
//! monitoring for localized sites.
//!
//! The crate has three layers:
//!
//! - [`storage`]: a key-value persistence seam (the local-storage analog)
//!   and the bounded locale-detection history kept on it.
//! - [`i18n`]: the locale registry, translation cache over an injected
//!   loader, cross-locale validation, and per-request configuration with
//!   hard failure containment: a broken bundle degrades to key-fallback
//!   text, never a crashed render.
//! - [`vitals`]: web-vitals collection over an injected platform source,
//!   bounded performance baselines, regression detection, alerting, and
//!   the monitoring manager that runs one cycle per page load.
//!
//! # Example
//!
//! ```rust,ignore
//! use pagepulse::config::MonitoringConfig;
//! use pagepulse::storage::MemoryStore;
//! use pagepulse::vitals::{MonitoringManager, SimulatedSource};
//!
//! let manager = MonitoringManager::new(
//!     SimulatedSource::new(),
//!     MemoryStore::new(),
//!     MonitoringConfig::from_env(),
//! );
//! manager.initialize();
//! let outcome = manager.perform_full_monitoring("/en/about", None).await?;
//! println!("{}", outcome.report);
//! ```

pub mod config;
pub mod i18n;
pub mod storage;
pub mod vitals;

pub use config::MonitoringConfig;
pub use i18n::{
    Locale, MessageLoader, Messages, RequestContext, RequestResolver, TranslationCache,
    TranslationValidator,
};
pub use storage::{FileStore, HistoryStore, KeyValueStore, MemoryStore};
pub use vitals::{DetailedWebVitals, MonitoringManager, SimulatedSource};
