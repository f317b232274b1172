use std::time::Duration;

use gridwatch_core::alerting::DEFAULT_ALERT_THRESHOLD;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
    pub monitor: MonitorConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `LOG_FORMAT`           | `text`                     |
    ///
    /// Monitor settings are read by [`MonitorConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            log_format,
            monitor: MonitorConfig::from_env(),
        }
    }
}

/// Quality monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Wait between successful passes (default: 60 minutes).
    pub check_interval: Duration,
    /// Overall score below which a system alert is raised (default: `70.0`).
    pub alert_threshold: f64,
    /// Wait after a failed pass (default: 5 minutes).
    pub retry_backoff: Duration,
    /// Start the schedule when the server boots (default: `true`).
    pub autostart: bool,
}

impl MonitorConfig {
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `QUALITY_CHECK_INTERVAL_MINUTES` | `60`    |
    /// | `QUALITY_ALERT_THRESHOLD`        | `70.0`  |
    /// | `QUALITY_RETRY_BACKOFF_SECS`     | `300`   |
    /// | `QUALITY_MONITOR_AUTOSTART`      | `true`  |
    pub fn from_env() -> Self {
        let interval_minutes: u64 = std::env::var("QUALITY_CHECK_INTERVAL_MINUTES")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("QUALITY_CHECK_INTERVAL_MINUTES must be a valid u64");

        let alert_threshold = std::env::var("QUALITY_ALERT_THRESHOLD")
            .map(|v| parse_alert_threshold(&v))
            .unwrap_or(Some(DEFAULT_ALERT_THRESHOLD))
            .expect("QUALITY_ALERT_THRESHOLD must be a number between 0 and 100");

        let retry_backoff_secs: u64 = std::env::var("QUALITY_RETRY_BACKOFF_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("QUALITY_RETRY_BACKOFF_SECS must be a valid u64");

        let autostart = std::env::var("QUALITY_MONITOR_AUTOSTART")
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        Self {
            check_interval: Duration::from_secs(interval_minutes.max(1) * 60),
            alert_threshold,
            retry_backoff: Duration::from_secs(retry_backoff_secs),
            autostart,
        }
    }

    pub fn check_interval_minutes(&self) -> u64 {
        self.check_interval.as_secs() / 60
    }
}

/// `None` unless `raw` is a number in `[0, 100]`.
fn parse_alert_threshold(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|t| (0.0..=100.0).contains(t))
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(60 * 60),
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            retry_backoff: Duration::from_secs(300),
            autostart: true,
        }
    }
}
