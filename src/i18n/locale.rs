//! Locale type: a validated handle into the registry.

use anyhow::{bail, Result};

use crate::i18n::formats::FormatPresets;
use crate::i18n::registry::{LocaleConfig, LocaleRegistry};

/// A validated locale.
///
/// Constructible only for codes the registry knows and has enabled, so a
/// `Locale` in hand always resolves to a full configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    code: &'static str,
}

impl Locale {
    /// English, the canonical locale.
    pub const ENGLISH: Locale = Locale { code: "en" };

    /// Chinese.
    pub const CHINESE: Locale = Locale { code: "zh" };

    /// Create a Locale from a locale code string.
    ///
    /// # Returns
    /// * `Ok(Locale)` if the code is registered and enabled
    /// * `Err` if the code is unknown or the locale is disabled
    pub fn from_code(code: &str) -> Result<Locale> {
        let registry = LocaleRegistry::get();
        match registry.get_by_code(code) {
            Some(config) if config.enabled => Ok(Locale { code: config.code }),
            Some(_) => bail!("Locale '{}' is not enabled", code),
            None => bail!("Unknown locale code: '{}'", code),
        }
    }

    /// Resolve an arbitrary candidate to a supported Locale, falling back to
    /// the canonical default. Never fails.
    pub fn resolve(candidate: Option<&str>) -> Locale {
        Locale {
            code: LocaleRegistry::get().normalize(candidate),
        }
    }

    /// The canonical (reference) locale.
    pub fn canonical() -> Locale {
        Locale {
            code: LocaleRegistry::get().canonical().code,
        }
    }

    /// The locale code (e.g. "en", "zh").
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Full registry configuration for this locale.
    ///
    /// # Panics
    /// Panics if the code is missing from the registry, which cannot happen
    /// for a properly constructed Locale.
    pub fn config(&self) -> &'static LocaleConfig {
        LocaleRegistry::get()
            .get_by_code(self.code)
            .expect("Locale code should always be registered")
    }

    /// English name of the locale.
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Native name of the locale.
    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    /// Whether this is the canonical locale.
    pub fn is_canonical(&self) -> bool {
        self.config().canonical
    }

    /// IANA time zone for this locale.
    pub fn time_zone(&self) -> &'static str {
        self.config().time_zone
    }

    /// Formatting presets for this locale.
    pub fn formats(&self) -> &'static FormatPresets {
        self.config().formats
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}
