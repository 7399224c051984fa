use std::time::Duration;

/// Monitoring and storage tuning, read from the environment with sane
/// defaults. Invalid values fall back rather than fail: monitoring must
/// never keep a site from starting.
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    /// Deployment environment recorded on baselines
    pub environment: String,

    /// Bound on retained baselines
    pub max_baselines: usize,

    /// Baselines older than this are removed by periodic cleanup
    pub baseline_max_age: Duration,

    /// A fresh baseline is saved once the last one is older than this
    pub baseline_refresh: Duration,

    /// Bound on retained locale detection records
    pub history_cap: usize,

    /// Detection records older than this are expired
    pub detection_max_age: Duration,

    /// Interval between periodic cleanup runs; zero disables the task
    pub cleanup_interval: Duration,

    /// Save a baseline automatically during each monitoring cycle when due
    pub auto_baseline: bool,
}

impl MonitoringConfig {
    pub fn from_env() -> Self {
        Self {
            environment: std::env::var("PAGEPULSE_ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            max_baselines: env_parse("PAGEPULSE_MAX_BASELINES", 50),
            baseline_max_age: Duration::from_secs(
                env_parse("PAGEPULSE_BASELINE_MAX_AGE_DAYS", 7u64) * 24 * 60 * 60,
            ),
            baseline_refresh: Duration::from_secs(
                env_parse("PAGEPULSE_BASELINE_REFRESH_HOURS", 24u64) * 60 * 60,
            ),
            history_cap: env_parse("PAGEPULSE_HISTORY_CAP", 100),
            detection_max_age: Duration::from_secs(
                env_parse("PAGEPULSE_DETECTION_MAX_AGE_DAYS", 30u64) * 24 * 60 * 60,
            ),
            cleanup_interval: Duration::from_secs(env_parse(
                "PAGEPULSE_CLEANUP_INTERVAL_SECS",
                3600u64,
            )),
            auto_baseline: std::env::var("PAGEPULSE_AUTO_BASELINE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            max_baselines: 50,
            baseline_max_age: Duration::from_secs(7 * 24 * 60 * 60),
            baseline_refresh: Duration::from_secs(24 * 60 * 60),
            history_cap: 100,
            detection_max_age: Duration::from_secs(30 * 24 * 60 * 60),
            cleanup_interval: Duration::from_secs(3600),
            auto_baseline: true,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
