//! Monitoring manager: one full cycle per page load.
//!
//! Orchestrates the collector, baseline store, regression detector and
//! alert system into a strictly sequential cycle: collect, resolve
//! page/locale, look up the recent baseline, detect regressions, alert,
//! conditionally save, report. Unlike the soft-failing layers underneath,
//! a broken cycle is logged *and* propagated: a silently wrong report is
//! worse than a visible failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

use chrono::Utc;
use regex::Regex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::MonitoringConfig;
use crate::i18n::LocaleRegistry;
use crate::storage::KeyValueStore;
use crate::vitals::alerts::{Alert, AlertSink, AlertSystem, AlertThresholds};
use crate::vitals::baseline::{BaselineStore, BuildInfo, PerformanceBaseline};
use crate::vitals::collector::{MetricsSource, VitalsCollector};
use crate::vitals::metrics::{grade_for, DetailedWebVitals, MetricKind};
use crate::vitals::regression::{detect_regression, RegressionDetectionResult};

#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("invalid page url: '{0}'")]
    InvalidPageUrl(String),
}

/// Everything one monitoring cycle produced.
#[derive(Debug)]
pub struct FullMonitoringOutcome {
    pub metrics: DetailedWebVitals,
    /// The baseline compared against, when one existed.
    pub baseline: Option<PerformanceBaseline>,
    pub regression: Option<RegressionDetectionResult>,
    pub alerts: Vec<Alert>,
    /// Human-readable composite report.
    pub report: String,
}

/// Lightweight summary for analytics glue code.
#[derive(Debug, Clone)]
pub struct PerformanceSummary {
    pub metrics: DetailedWebVitals,
    pub score: u32,
    pub grade: &'static str,
}

/// Orchestrates per-page-load performance monitoring.
pub struct MonitoringManager<S: KeyValueStore, M: MetricsSource> {
    collector: VitalsCollector<M>,
    baselines: BaselineStore<S>,
    alerts: AlertSystem,
    config: MonitoringConfig,
    initialized: AtomicBool,
    cleanup_task: Mutex<Option<JoinHandle<()>>>,
}

impl<S, M> MonitoringManager<S, M>
where
    S: KeyValueStore + Clone + 'static,
    M: MetricsSource,
{
    pub fn new(source: M, store: S, config: MonitoringConfig) -> Self {
        let baselines = BaselineStore::new(store, config.environment.clone())
            .with_capacity(config.max_baselines);
        Self {
            collector: VitalsCollector::new(source),
            baselines,
            alerts: AlertSystem::default(),
            config,
            initialized: AtomicBool::new(false),
            cleanup_task: Mutex::new(None),
        }
    }

    /// Replace the default log-backed alert sink.
    pub fn with_alert_sink(mut self, sink: Box<dyn AlertSink>) -> Self {
        self.alerts = AlertSystem::new(AlertThresholds::default(), sink);
        self
    }

    /// Start observers and, when configured, the periodic baseline cleanup
    /// task. Idempotent: a second call is a no-op.
    ///
    /// Must run inside a tokio runtime when `cleanup_interval` is nonzero.
    pub fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("monitoring already initialized, ignoring");
            return;
        }

        self.collector.start();

        if !self.config.cleanup_interval.is_zero() {
            let store = self.baselines.clone();
            let max_age = self.config.baseline_max_age;
            let every = self.config.cleanup_interval;
            let handle = tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                // interval fires immediately; the first cleanup waits one period
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    let removed = store.cleanup_old_baselines(max_age);
                    if removed > 0 {
                        info!("periodic cleanup removed {} baselines", removed);
                    }
                }
            });
            *self.cleanup_task.lock().unwrap() = Some(handle);
        }

        info!("performance monitoring initialized");
    }

    /// Stop the cleanup task and disconnect all observers.
    pub fn shutdown(&self) {
        if let Some(handle) = self.cleanup_task.lock().unwrap().take() {
            handle.abort();
        }
        self.collector.cleanup();
        self.initialized.store(false, Ordering::SeqCst);
    }

    /// Run one full monitoring cycle for the page at `url`.
    ///
    /// Steps run strictly in order because each depends on the previous:
    /// collect → page/locale → baseline lookup → regression → alerts →
    /// conditional save → report. Failures are logged and returned to the
    /// caller rather than absorbed.
    pub async fn perform_full_monitoring(
        &self,
        url: &str,
        build_info: Option<BuildInfo>,
    ) -> Result<FullMonitoringOutcome, MonitoringError> {
        let (page, locale) = parse_page_locale(url).map_err(|e| {
            error!("monitoring cycle aborted: {}", e);
            e
        })?;
        info!("monitoring cycle for {} (locale: {:?})", page, locale);

        let metrics = self.collector.snapshot(&page);

        let baseline = self
            .baselines
            .get_recent_baseline(Some(&page), locale.as_deref());

        let regression = baseline
            .as_ref()
            .map(|baseline| detect_regression(&metrics, baseline));
        if let Some(result) = regression.as_ref().filter(|r| r.regressed) {
            info!(
                "detected {} regressed metric(s) vs baseline {}",
                result.regressions.len(),
                result.baseline_id
            );
        }

        let alerts = self.alerts.check_and_alert(&metrics, regression.as_ref());

        if self.should_save_baseline(baseline.as_ref()) {
            let user_agent = self.collector.source().context().user_agent;
            self.baselines
                .save_baseline(&metrics, url, &user_agent, build_info);
        }

        let report = render_report(&metrics, baseline.as_ref(), regression.as_ref(), &alerts);

        Ok(FullMonitoringOutcome {
            metrics,
            baseline,
            regression,
            alerts,
            report,
        })
    }

    /// Current metrics with score and grade.
    pub fn get_performance_summary(&self, page: &str) -> PerformanceSummary {
        let metrics = self.collector.snapshot(page);
        let score = metrics.score();
        PerformanceSummary {
            metrics,
            score,
            grade: grade_for(score),
        }
    }

    pub fn baselines(&self) -> &BaselineStore<S> {
        &self.baselines
    }

    pub fn collector(&self) -> &VitalsCollector<M> {
        &self.collector
    }

    /// Save when auto-baselining is on and there is either no baseline for
    /// this page/locale yet, or the last one has aged past the refresh
    /// window (default 24h).
    fn should_save_baseline(&self, baseline: Option<&PerformanceBaseline>) -> bool {
        if !self.config.auto_baseline {
            return false;
        }
        match baseline {
            None => true,
            Some(baseline) => {
                let age_ms = Utc::now().timestamp_millis() - baseline.timestamp;
                age_ms > self.config.baseline_refresh.as_millis() as i64
            }
        }
    }
}

static URL_PATH_REGEX: OnceLock<Regex> = OnceLock::new();

/// Derive the page path and locale from a URL or bare path.
///
/// Accepts full URLs ("https://site.test/zh/about?x=1") and bare paths
/// ("/zh/about"); the locale is the leading path segment when it names an
/// enabled locale. Empty input and embedded whitespace are rejected.
fn parse_page_locale(url: &str) -> Result<(String, Option<String>), MonitoringError> {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(MonitoringError::InvalidPageUrl(url.to_string()));
    }

    let regex = URL_PATH_REGEX.get_or_init(|| {
        Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://[^/]*)?(/[^?#]*)?").unwrap()
    });

    let path = regex
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| {
            if trimmed.contains("://") {
                "/".to_string()
            } else {
                format!("/{}", trimmed)
            }
        });

    let registry = LocaleRegistry::get();
    let locale = path
        .split('/')
        .find(|segment| !segment.is_empty())
        .filter(|segment| registry.is_enabled(segment))
        .map(|segment| segment.to_string());

    Ok((path, locale))
}

fn render_report(
    metrics: &DetailedWebVitals,
    baseline: Option<&PerformanceBaseline>,
    regression: Option<&RegressionDetectionResult>,
    alerts: &[Alert],
) -> String {
    let mut lines = Vec::new();
    lines.push(format!("📊 Performance report for {}", metrics.page));
    lines.push(format!(
        "Score: {}/100 (grade {})",
        metrics.score(),
        metrics.grade()
    ));

    for kind in MetricKind::ALL {
        match metrics.value(kind) {
            Some(value) => {
                let status = metrics
                    .status(kind)
                    .map(|s| s.emoji())
                    .unwrap_or("⚪");
                let formatted = if kind == MetricKind::Cls {
                    format!("{:.3}", value)
                } else {
                    format!("{:.0}ms", value)
                };
                lines.push(format!("{} {}: {}", status, kind.label(), formatted));
            }
            None => lines.push(format!("⚪ {}: n/a", kind.label())),
        }
    }

    match baseline {
        Some(baseline) => {
            let age_hours =
                (Utc::now().timestamp_millis() - baseline.timestamp) as f64 / 3_600_000.0;
            lines.push(format!(
                "Baseline: {} ({:.1}h old, score {})",
                baseline.id, age_hours, baseline.score
            ));
        }
        None => lines.push("Baseline: none (first measurement for this page)".to_string()),
    }

    match regression {
        Some(result) if result.regressed => {
            lines.push(format!(
                "⚠️ {} metric(s) regressed:",
                result.regressions.len()
            ));
            for regressed in &result.regressions {
                lines.push(format!(
                    "  {} {} {:.2} -> {:.2} ({:+.0}%)",
                    regressed.current_status.emoji(),
                    regressed.kind.label(),
                    regressed.baseline_value,
                    regressed.current_value,
                    regressed.delta_pct
                ));
            }
        }
        Some(_) => lines.push("No regressions vs baseline".to_string()),
        None => {}
    }

    if !alerts.is_empty() {
        lines.push(format!("Alerts fired: {}", alerts.len()));
    }

    lines.join("\n")
}
