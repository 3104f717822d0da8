//! Runtime configuration for the viewer and the simulator.
//!
//! Values come from the environment first; command-line flags override them.
//! Unparsable environment values are ignored with a warning.

use std::str::FromStr;
use std::time::Duration;

use log::warn;

use crate::assembler::DEFAULT_FETCH_TIMEOUT;
use crate::change::DEFAULT_EPSILON;
use crate::store::DEFAULT_CAPACITY;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:9090";
pub const DEFAULT_VIEWER_PORT: u16 = 10000;
pub const DEFAULT_SIMULATOR_PORT: u16 = 8000;
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(2000);

/// Settings for the polling viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Base URL of the Prometheus server (`PROM_URL`).
    pub backend_url: String,
    /// Port for the snapshot endpoint (`PORT`).
    pub port: u16,
    /// Tick period (`REFRESH_MS`).
    pub refresh: Duration,
    /// Per-request bound (`FETCH_TIMEOUT_MS`).
    pub fetch_timeout: Duration,
    pub history: usize,
    pub epsilon: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            port: DEFAULT_VIEWER_PORT,
            refresh: DEFAULT_REFRESH,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            history: DEFAULT_CAPACITY,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            backend_url: lookup("PROM_URL")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.backend_url),
            port: parse_or(&lookup, "PORT", defaults.port),
            refresh: millis_or(&lookup, "REFRESH_MS", defaults.refresh),
            fetch_timeout: millis_or(&lookup, "FETCH_TIMEOUT_MS", defaults.fetch_timeout),
            ..defaults
        }
    }
}

/// Settings for the metric simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub port: u16,
    pub period: Duration,
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_SIMULATOR_PORT,
            period: crate::simulator::DEFAULT_PERIOD,
            seed: None,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("ignoring invalid {key}={raw:?}");
                default
            }
        },
        None => default,
    }
}

/// Positive millisecond duration; zero is treated as invalid.
fn millis_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> Duration {
    match parse_or(lookup, key, default.as_millis() as u64) {
        0 => {
            warn!("ignoring invalid {key}=0, must be positive");
            default
        }
        ms => Duration::from_millis(ms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let cfg = ViewerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg, ViewerConfig::default());
        assert_eq!(cfg.backend_url, "http://localhost:9090");
        assert_eq!(cfg.port, 10000);
        assert_eq!(cfg.refresh, Duration::from_millis(2000));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(5));
        assert_eq!(cfg.history, 50);
    }

    #[test]
    fn environment_overrides() {
        let cfg = ViewerConfig::from_lookup(lookup(&[
            ("PROM_URL", "http://prometheus:9090"),
            ("PORT", "8080"),
            ("REFRESH_MS", "500"),
        ]));
        assert_eq!(cfg.backend_url, "http://prometheus:9090");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.refresh, Duration::from_millis(500));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = ViewerConfig::from_lookup(lookup(&[("PORT", "not-a-port"), ("PROM_URL", "  ")]));
        assert_eq!(cfg.port, DEFAULT_VIEWER_PORT);
        assert_eq!(cfg.backend_url, DEFAULT_BACKEND_URL);

        let cfg = ViewerConfig::from_lookup(lookup(&[
            ("REFRESH_MS", "0"),
            ("FETCH_TIMEOUT_MS", "0"),
        ]));
        assert_eq!(cfg.refresh, DEFAULT_REFRESH);
        assert_eq!(cfg.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
    }

    #[test]
    fn simulator_defaults() {
        let cfg = SimulatorConfig::default();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.period, Duration::from_secs(5));
        assert_eq!(cfg.seed, None);
    }
}
