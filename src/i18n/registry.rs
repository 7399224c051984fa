//! Locale registry: single source of truth for all supported locales.
//!
//! Centralizes every locale the site serves together with the metadata the
//! request layer needs (time zone, currency, formatting presets). Uses a
//! singleton with `OnceLock` for thread-safe initialization and access.

use std::sync::OnceLock;

use serde::Serialize;

use crate::i18n::formats::{FormatPresets, EN_FORMATS, ZH_FORMATS};

/// Configuration for one supported locale.
#[derive(Debug, Clone, Serialize)]
pub struct LocaleConfig {
    /// BCP 47 primary-subtag locale code (e.g. "en", "zh")
    pub code: &'static str,

    /// English name of the locale (e.g. "English", "Chinese")
    pub name: &'static str,

    /// Native name of the locale (e.g. "English", "中文")
    pub native_name: &'static str,

    /// Whether this is the canonical/reference locale (exactly one is)
    pub canonical: bool,

    /// Whether this locale is enabled for serving
    pub enabled: bool,

    /// IANA time zone used when rendering for this locale
    pub time_zone: &'static str,

    /// ISO 4217 currency code for number formatting
    pub currency: &'static str,

    /// Date/number/list formatting presets
    #[serde(skip)]
    pub formats: &'static FormatPresets,
}

/// Global locale registry singleton.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the global registry, initializing it on first access.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: default_locales(),
        })
    }

    /// Look up a locale configuration by exact code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All enabled locales.
    pub fn list_enabled(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().filter(|l| l.enabled).collect()
    }

    /// All locales, including disabled ones.
    pub fn list_all(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().collect()
    }

    /// The canonical (reference) locale.
    ///
    /// # Panics
    /// Panics if zero or multiple canonical locales are configured; either
    /// is a configuration error.
    pub fn canonical(&self) -> &LocaleConfig {
        let canonical: Vec<_> = self.locales.iter().filter(|l| l.canonical).collect();
        match canonical.len() {
            0 => panic!("No canonical locale found in registry"),
            1 => canonical[0],
            _ => panic!("Multiple canonical locales found in registry"),
        }
    }

    /// Whether `code` names a supported, enabled locale.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.get_by_code(code).map(|l| l.enabled).unwrap_or(false)
    }

    /// Normalize an arbitrary candidate to a supported locale code.
    ///
    /// Resolution order: exact match, ASCII-case-insensitive match, primary
    /// subtag match ("zh-CN" resolves to "zh"), then the canonical default.
    /// `None`, empty and whitespace-only input all resolve to the default.
    pub fn normalize(&self, candidate: Option<&str>) -> &'static str {
        let raw = candidate.unwrap_or("").trim();
        if raw.is_empty() {
            return self.canonical().code;
        }

        if let Some(found) = self
            .locales
            .iter()
            .find(|l| l.enabled && l.code.eq_ignore_ascii_case(raw))
        {
            return found.code;
        }

        // "zh-CN" / "zh_Hans" style tags match on the primary subtag
        let primary = raw.split(|c| c == '-' || c == '_').next().unwrap_or(raw);
        if let Some(found) = self
            .locales
            .iter()
            .find(|l| l.enabled && l.code.eq_ignore_ascii_case(primary))
        {
            return found.code;
        }

        self.canonical().code
    }
}

/// Default locale set: English (canonical) and Chinese.
fn default_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            canonical: true,
            enabled: true,
            time_zone: "UTC",
            currency: "USD",
            formats: &EN_FORMATS,
        },
        LocaleConfig {
            code: "zh",
            name: "Chinese",
            native_name: "中文",
            canonical: false,
            enabled: true,
            time_zone: "Asia/Shanghai",
            currency: "CNY",
            formats: &ZH_FORMATS,
        },
    ]
}
