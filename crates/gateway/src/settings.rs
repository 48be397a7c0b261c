use std::time::Duration;

use alertsforge_common::env::{env_duration, env_or};

const DEFAULT_CONFIG_PATH: &str = "./config/runbooks.yaml";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide knobs, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: String,
    pub port: u16,
    /// When set, the buffer is loaded from this path at startup and saved
    /// back after dispatching ticks.
    pub storage_path: Option<String>,
    /// Re-notification cadence for still-firing alerts. Unset disables
    /// re-sinking.
    pub resink_interval: Option<Duration>,
    /// Delay added to `ends_at` at ingest when the alert carries no explicit
    /// delay label.
    pub default_resolve_delay: Option<Duration>,
    /// Bound on every outbound HTTP call (enrichers, sinks, blob store).
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: DEFAULT_CONFIG_PATH.to_string(),
            port: DEFAULT_PORT,
            storage_path: None,
            resink_interval: None,
            default_resolve_delay: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let raw_port = env_or("AF_PORT", "");
        let port = if raw_port.is_empty() {
            DEFAULT_PORT
        } else {
            raw_port.parse().unwrap_or_else(|_| {
                tracing::error!(value = %raw_port, "can't parse AF_PORT, using default");
                DEFAULT_PORT
            })
        };

        Self {
            config_path: env_or("AF_CONFIG_PATH", DEFAULT_CONFIG_PATH),
            port,
            storage_path: match env_or("AF_STORAGE_PATH", "") {
                path if path.is_empty() => None,
                path => Some(path),
            },
            resink_interval: duration_from_env("AF_RESINK_TIME"),
            default_resolve_delay: duration_from_env("AF_DEFAULT_RESOLVE_DELAY"),
            http_timeout: duration_from_env("AF_HTTP_TIMEOUT").unwrap_or(DEFAULT_HTTP_TIMEOUT),
        }
    }
}

fn duration_from_env(name: &str) -> Option<Duration> {
    match env_duration(name)? {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::error!(var = name, error = %e, "can't parse duration, treating as unset");
            None
        }
    }
}
