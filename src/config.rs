//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::tasks::MAX_CLEANUP_INTERVAL;

const DEFAULT_ENABLED: bool = true;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Initial state of the enablement gate
    pub enabled: bool,
    /// Reaper interval, None = do not start a reaper
    pub cleanup_interval: Option<Duration>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - true/false, 1/0, yes/no, on/off (default: true)
    /// - `CACHE_CLEANUP_INTERVAL` - Reaper interval in seconds, 0 disables the reaper,
    ///   at most one year (default: 60)
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = parse_var(&lookup, "CACHE_ENABLED", parse_bool, DEFAULT_ENABLED);
        let interval_secs = parse_var(
            &lookup,
            "CACHE_CLEANUP_INTERVAL",
            |v| {
                u64::from_str(v)
                    .ok()
                    .filter(|secs| *secs <= MAX_CLEANUP_INTERVAL.as_secs())
            },
            DEFAULT_CLEANUP_INTERVAL_SECS,
        );

        Self {
            enabled,
            cleanup_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ENABLED,
            cleanup_interval: Some(Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS)),
        }
    }
}

fn parse_var<F, P, T>(lookup: &F, name: &str, parse: P, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
    T: std::fmt::Debug,
{
    match lookup(name) {
        Some(raw) => parse(raw.trim()).unwrap_or_else(|| {
            warn!("Ignoring invalid {}={:?}, using default {:?}", name, raw, default);
            default
        }),
        None => default,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
