//! Internationalization (i18n) runtime.
//!
//! Everything locale-related lives here: the registry of supported
//! locales, per-locale formatting presets, the translation cache over an
//! injected loader, cross-locale bundle validation, and per-request
//! configuration resolution.
//!
//! # Architecture
//!
//! - `registry`: single source of truth for supported locales and metadata
//! - `locale`: validated `Locale` type constructed through the registry
//! - `formats`: per-locale date/number/list formatting presets
//! - `messages`: the immutable bundle model with key flattening and lookup
//! - `cache`: process-wide bundle cache over a `MessageLoader`
//! - `metrics`: cache hit/miss/error accounting
//! - `validator`: cross-locale coverage validation
//! - `request`: per-request context resolution with fallback containment

mod cache;
mod formats;
mod locale;
mod messages;
mod metrics;
mod registry;
mod request;
mod validator;

pub use cache::{CacheHit, CacheStats, I18nError, MessageLoader, TranslationCache};
pub use formats::{
    CurrencyFormat, DateFormats, DateStylePreset, DecimalFormat, FormatPresets, ListFormat,
    NumberFormats, PercentFormat, EN_FORMATS, ZH_FORMATS,
};
pub use locale::Locale;
pub use messages::{FlattenedKeys, MessageTree, Messages, MAX_FLATTEN_DEPTH};
pub use metrics::{CacheMetrics, CacheMetricsReport};
pub use registry::{LocaleConfig, LocaleRegistry};
pub use request::{RequestContext, RequestMetadata, RequestResolver};
pub use validator::{TranslationValidator, ValidationIssue, ValidationResult};
