//! Web-vitals metric model: the per-cycle snapshot, status tiers and the
//! coarse performance score.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// The tracked web-vitals metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Cumulative Layout Shift (unitless)
    Cls,
    /// Largest Contentful Paint (ms)
    Lcp,
    /// First Input Delay (ms)
    Fid,
    /// First Contentful Paint (ms)
    Fcp,
    /// Time To First Byte (ms)
    Ttfb,
    /// Interaction to Next Paint (ms)
    Inp,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::Cls,
        MetricKind::Lcp,
        MetricKind::Fid,
        MetricKind::Fcp,
        MetricKind::Ttfb,
        MetricKind::Inp,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Cls => "CLS",
            MetricKind::Lcp => "LCP",
            MetricKind::Fid => "FID",
            MetricKind::Fcp => "FCP",
            MetricKind::Ttfb => "TTFB",
            MetricKind::Inp => "INP",
        }
    }

    /// Standard status cutoffs for this metric.
    pub fn thresholds(&self) -> MetricThresholds {
        match self {
            MetricKind::Cls => MetricThresholds::new(0.1, 0.25),
            MetricKind::Lcp => MetricThresholds::new(2500.0, 4000.0),
            MetricKind::Fid => MetricThresholds::new(100.0, 300.0),
            MetricKind::Fcp => MetricThresholds::new(1800.0, 3000.0),
            MetricKind::Ttfb => MetricThresholds::new(800.0, 1800.0),
            MetricKind::Inp => MetricThresholds::new(200.0, 500.0),
        }
    }
}

/// GOOD / NEEDS_IMPROVEMENT cutoffs. Values at or below `good` are good;
/// values above `needs_improvement` are poor; the band between is
/// needs-improvement. All tracked metrics are lower-is-better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricThresholds {
    pub good: f64,
    pub needs_improvement: f64,
}

impl MetricThresholds {
    pub const fn new(good: f64, needs_improvement: f64) -> Self {
        Self {
            good,
            needs_improvement,
        }
    }

    pub fn classify(&self, value: f64) -> MetricStatus {
        if value <= self.good {
            MetricStatus::Good
        } else if value <= self.needs_improvement {
            MetricStatus::NeedsImprovement
        } else {
            MetricStatus::Poor
        }
    }
}

/// Traffic-light status of one metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricStatus {
    Good,
    NeedsImprovement,
    Poor,
}

impl MetricStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            MetricStatus::Good => "🟢",
            MetricStatus::NeedsImprovement => "🟡",
            MetricStatus::Poor => "🔴",
        }
    }

    /// Status of `value` for `kind` under the standard thresholds.
    pub fn of(kind: MetricKind, value: f64) -> MetricStatus {
        kind.thresholds().classify(value)
    }
}

/// One immutable web-vitals snapshot, captured once per monitoring cycle.
///
/// Metric fields are `None` until the corresponding observer has seen an
/// entry (e.g. FID stays `None` on a page load with no input).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedWebVitals {
    pub cls: Option<f64>,
    pub lcp: Option<f64>,
    pub fid: Option<f64>,
    pub fcp: Option<f64>,
    pub ttfb: Option<f64>,
    pub inp: Option<f64>,

    pub dom_content_loaded: Option<f64>,
    pub load_complete: Option<f64>,
    pub first_paint: Option<f64>,

    /// Page path the snapshot was captured on (e.g. "/en/about").
    pub page: String,
    /// Coarse device class reported by the platform source.
    pub device: String,
    /// Connection type reported by the platform source (e.g. "4g").
    pub connection: String,
    /// Unix epoch milliseconds at capture time.
    pub captured_at: i64,
}

impl DetailedWebVitals {
    /// An empty snapshot for `page`, stamped with the current time.
    pub fn empty(page: impl Into<String>) -> Self {
        Self {
            cls: None,
            lcp: None,
            fid: None,
            fcp: None,
            ttfb: None,
            inp: None,
            dom_content_loaded: None,
            load_complete: None,
            first_paint: None,
            page: page.into(),
            device: String::new(),
            connection: String::new(),
            captured_at: Utc::now().timestamp_millis(),
        }
    }

    /// The value observed for `kind`, if any.
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        match kind {
            MetricKind::Cls => self.cls,
            MetricKind::Lcp => self.lcp,
            MetricKind::Fid => self.fid,
            MetricKind::Fcp => self.fcp,
            MetricKind::Ttfb => self.ttfb,
            MetricKind::Inp => self.inp,
        }
    }

    /// Status of `kind` under the standard thresholds, if observed.
    pub fn status(&self, kind: MetricKind) -> Option<MetricStatus> {
        self.value(kind).map(|v| MetricStatus::of(kind, v))
    }

    /// Coarse performance score.
    ///
    /// Starts at 100 and subtracts a fixed penalty when CLS, LCP or FID
    /// crosses a threshold tier; unobserved metrics cost nothing.
    pub fn score(&self) -> u32 {
        let mut score: u32 = 100;
        for (kind, ni_penalty, poor_penalty) in [
            (MetricKind::Cls, 10u32, 25u32),
            (MetricKind::Lcp, 15, 30),
            (MetricKind::Fid, 10, 25),
        ] {
            match self.status(kind) {
                Some(MetricStatus::NeedsImprovement) => score = score.saturating_sub(ni_penalty),
                Some(MetricStatus::Poor) => score = score.saturating_sub(poor_penalty),
                _ => {}
            }
        }
        score
    }

    /// Letter grade for the score.
    pub fn grade(&self) -> &'static str {
        grade_for(self.score())
    }
}

/// Letter grade for a 0-100 performance score.
pub fn grade_for(score: u32) -> &'static str {
    match score {
        90..=100 => "A",
        80..=89 => "B",
        70..=79 => "C",
        60..=69 => "D",
        _ => "F",
    }
}
