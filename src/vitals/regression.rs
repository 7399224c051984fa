//! Regression detection against the most recent baseline.
//!
//! A metric counts as regressed only when both conditions hold:
//!
//! 1. it worsened by more than [`REGRESSION_DELTA_PCT`] percent relative to
//!    the baseline value, and
//! 2. its status tier is strictly worse than the baseline's tier.
//!
//! The relative check keeps tiny absolute wobbles near a tier boundary from
//! flagging; the tier check keeps large-but-still-good swings (say 10ms to
//! 14ms TTFB) from flagging. Results are ephemeral and never persisted.

use serde::Serialize;

use crate::vitals::baseline::PerformanceBaseline;
use crate::vitals::metrics::{DetailedWebVitals, MetricKind, MetricStatus};

/// Minimum relative worsening, in percent, before a metric can flag.
pub const REGRESSION_DELTA_PCT: f64 = 20.0;

/// One regressed metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRegression {
    pub kind: MetricKind,
    pub baseline_value: f64,
    pub current_value: f64,
    /// Relative worsening in percent; infinite when the baseline was zero.
    pub delta_pct: f64,
    pub baseline_status: MetricStatus,
    pub current_status: MetricStatus,
}

/// Outcome of comparing a snapshot against one baseline.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionDetectionResult {
    pub regressed: bool,
    pub regressions: Vec<MetricRegression>,
    /// Id of the baseline compared against.
    pub baseline_id: String,
}

/// Compare `current` against `baseline`, metric by metric.
///
/// A metric missing on either side never flags: there is nothing sound to
/// compare.
pub fn detect_regression(
    current: &DetailedWebVitals,
    baseline: &PerformanceBaseline,
) -> RegressionDetectionResult {
    let mut regressions = Vec::new();

    for kind in MetricKind::ALL {
        let (current_value, baseline_value) =
            match (current.value(kind), baseline.metrics.value(kind)) {
                (Some(current_value), Some(baseline_value)) => (current_value, baseline_value),
                _ => continue,
            };

        let delta_pct = if baseline_value > 0.0 {
            ((current_value - baseline_value) / baseline_value) * 100.0
        } else if current_value > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let baseline_status = MetricStatus::of(kind, baseline_value);
        let current_status = MetricStatus::of(kind, current_value);

        if delta_pct > REGRESSION_DELTA_PCT && current_status > baseline_status {
            regressions.push(MetricRegression {
                kind,
                baseline_value,
                current_value,
                delta_pct,
                baseline_status,
                current_status,
            });
        }
    }

    RegressionDetectionResult {
        regressed: !regressions.is_empty(),
        regressions,
        baseline_id: baseline.id.clone(),
    }
}
