//! Web-vitals performance monitoring pipeline.
//!
//! - `metrics`: the snapshot model, status tiers and scoring
//! - `collector`: observers over an injected platform source
//! - `baseline`: bounded, persisted performance baselines
//! - `regression`: comparison of a snapshot against the recent baseline
//! - `alerts`: threshold evaluation and alert dispatch
//! - `monitor`: the per-page-load orchestration cycle

mod alerts;
mod baseline;
mod collector;
mod metrics;
mod monitor;
mod regression;

pub use alerts::{Alert, AlertSeverity, AlertSink, AlertSystem, AlertThresholds, TracingSink};
pub use baseline::{BaselineStore, BuildInfo, PerformanceBaseline, BASELINES_KEY, MAX_BASELINES};
pub use collector::{
    EntryCallback, EntryKind, MetricsSource, NavigationTiming, ObserveError, PerformanceEntry,
    SimulatedSource, SourceContext, Subscription, VitalsCollector,
};
pub use metrics::{
    grade_for, DetailedWebVitals, MetricKind, MetricStatus, MetricThresholds,
};
pub use monitor::{
    FullMonitoringOutcome, MonitoringError, MonitoringManager, PerformanceSummary,
};
pub use regression::{
    detect_regression, MetricRegression, RegressionDetectionResult, REGRESSION_DELTA_PCT,
};
