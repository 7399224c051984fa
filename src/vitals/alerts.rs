//! Threshold-driven performance alerting.
//!
//! Evaluates a vitals snapshot (and an optional regression result) against
//! configured per-metric thresholds and dispatches the resulting alerts
//! through an injected [`AlertSink`]. The default sink writes to the log.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, warn};

use crate::vitals::metrics::{DetailedWebVitals, MetricKind, MetricStatus, MetricThresholds};
use crate::vitals::regression::RegressionDetectionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// One fired alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub kind: MetricKind,
    pub message: String,
    /// Unix epoch milliseconds when the alert fired.
    pub timestamp: i64,
}

/// Per-metric alert cutoffs, defaulting to the standard status thresholds:
/// a value in the needs-improvement band warns, a value past it is
/// critical.
#[derive(Debug, Clone)]
pub struct AlertThresholds {
    thresholds: HashMap<MetricKind, MetricThresholds>,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            thresholds: MetricKind::ALL
                .into_iter()
                .map(|kind| (kind, kind.thresholds()))
                .collect(),
        }
    }
}

impl AlertThresholds {
    /// Override the cutoffs for one metric.
    pub fn with_metric(mut self, kind: MetricKind, thresholds: MetricThresholds) -> Self {
        self.thresholds.insert(kind, thresholds);
        self
    }

    fn classify(&self, kind: MetricKind, value: f64) -> MetricStatus {
        self.thresholds
            .get(&kind)
            .copied()
            .unwrap_or_else(|| kind.thresholds())
            .classify(value)
    }
}

/// Delivery channel for fired alerts.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, alert: &Alert);
}

/// Default sink: alerts land in the log.
pub struct TracingSink;

impl AlertSink for TracingSink {
    fn deliver(&self, alert: &Alert) {
        match alert.severity {
            AlertSeverity::Warning => warn!("[perf alert] {}", alert.message),
            AlertSeverity::Critical => error!("[perf alert] {}", alert.message),
        }
    }
}

/// Evaluates thresholds and dispatches alerts.
pub struct AlertSystem {
    thresholds: AlertThresholds,
    sink: Box<dyn AlertSink>,
}

impl Default for AlertSystem {
    fn default() -> Self {
        Self::new(AlertThresholds::default(), Box::new(TracingSink))
    }
}

impl AlertSystem {
    pub fn new(thresholds: AlertThresholds, sink: Box<dyn AlertSink>) -> Self {
        Self { thresholds, sink }
    }

    /// Evaluate `vitals` (and optionally a regression result), dispatching
    /// every alert through the sink and returning them.
    ///
    /// Threshold alerts: a metric in the needs-improvement band warns; a
    /// metric past it is critical. Each confirmed regression also fires,
    /// critical when the current value sits in the poor tier.
    pub fn check_and_alert(
        &self,
        vitals: &DetailedWebVitals,
        regression: Option<&RegressionDetectionResult>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::new();
        let now = Utc::now().timestamp_millis();

        for kind in MetricKind::ALL {
            let value = match vitals.value(kind) {
                Some(value) => value,
                None => continue,
            };
            let severity = match self.thresholds.classify(kind, value) {
                MetricStatus::Good => continue,
                MetricStatus::NeedsImprovement => AlertSeverity::Warning,
                MetricStatus::Poor => AlertSeverity::Critical,
            };
            alerts.push(Alert {
                severity,
                kind,
                message: format!(
                    "{} {} is {:.2} on {} (thresholds: good <= {}, poor > {})",
                    MetricStatus::of(kind, value).emoji(),
                    kind.label(),
                    value,
                    vitals.page,
                    kind.thresholds().good,
                    kind.thresholds().needs_improvement,
                ),
                timestamp: now,
            });
        }

        if let Some(result) = regression {
            for regressed in &result.regressions {
                let severity = if regressed.current_status == MetricStatus::Poor {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Warning
                };
                alerts.push(Alert {
                    severity,
                    kind: regressed.kind,
                    message: format!(
                        "{} regressed {:.0}% vs baseline {} ({:.2} -> {:.2}) on {}",
                        regressed.kind.label(),
                        regressed.delta_pct,
                        result.baseline_id,
                        regressed.baseline_value,
                        regressed.current_value,
                        vitals.page,
                    ),
                    timestamp: now,
                });
            }
        }

        for alert in &alerts {
            self.sink.deliver(alert);
        }
        alerts
    }
}
