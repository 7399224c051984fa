//! Per-locale formatting presets.
//!
//! Presets mirror the option bags the rendering layer feeds to its date,
//! number and list formatters, so a request context can hand them over
//! without translation.

use serde::Serialize;

/// All formatting presets for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatPresets {
    pub date: DateFormats,
    pub number: NumberFormats,
    pub list: ListFormat,
}

// ==================== Date ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateFormats {
    pub short: DateStylePreset,
    pub long: DateStylePreset,
}

/// Field styles for one date preset ("numeric", "2-digit", "short", "long").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateStylePreset {
    pub year: &'static str,
    pub month: &'static str,
    pub day: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<&'static str>,
}

// ==================== Number ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberFormats {
    pub decimal: DecimalFormat,
    pub currency: CurrencyFormat,
    pub percent: PercentFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecimalFormat {
    pub style: &'static str,
    pub min_fraction_digits: u8,
    pub max_fraction_digits: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyFormat {
    pub style: &'static str,
    /// ISO 4217 code (e.g. "USD", "CNY")
    pub currency: &'static str,
    pub min_fraction_digits: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PercentFormat {
    pub style: &'static str,
    pub max_fraction_digits: u8,
}

// ==================== List ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ListFormat {
    /// "long" | "short" | "narrow"
    pub style: &'static str,
    /// "conjunction" | "disjunction" | "unit"
    pub kind: &'static str,
}

// ==================== English Presets ====================

/// English formatting presets (canonical locale).
pub const EN_FORMATS: FormatPresets = FormatPresets {
    date: DateFormats {
        short: DateStylePreset {
            year: "numeric",
            month: "short",
            day: "numeric",
            weekday: None,
        },
        long: DateStylePreset {
            year: "numeric",
            month: "long",
            day: "numeric",
            weekday: Some("long"),
        },
    },
    number: NumberFormats {
        decimal: DecimalFormat {
            style: "decimal",
            min_fraction_digits: 0,
            max_fraction_digits: 2,
        },
        currency: CurrencyFormat {
            style: "currency",
            currency: "USD",
            min_fraction_digits: 2,
        },
        percent: PercentFormat {
            style: "percent",
            max_fraction_digits: 1,
        },
    },
    list: ListFormat {
        style: "long",
        kind: "conjunction",
    },
};

// ==================== Chinese Presets ====================

/// Chinese formatting presets. Currency is CNY; long dates carry the
/// weekday the way zh-CN rendering expects.
pub const ZH_FORMATS: FormatPresets = FormatPresets {
    date: DateFormats {
        short: DateStylePreset {
            year: "numeric",
            month: "numeric",
            day: "numeric",
            weekday: None,
        },
        long: DateStylePreset {
            year: "numeric",
            month: "long",
            day: "numeric",
            weekday: Some("long"),
        },
    },
    number: NumberFormats {
        decimal: DecimalFormat {
            style: "decimal",
            min_fraction_digits: 0,
            max_fraction_digits: 2,
        },
        currency: CurrencyFormat {
            style: "currency",
            currency: "CNY",
            min_fraction_digits: 2,
        },
        percent: PercentFormat {
            style: "percent",
            max_fraction_digits: 1,
        },
    },
    list: ListFormat {
        style: "long",
        kind: "conjunction",
    },
};
