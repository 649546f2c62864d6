//! Process configuration loaded from the environment (and `.env`).

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Bittensor test network
pub const DEFAULT_SUBTENSOR_ENDPOINT: &str = "wss://test.finney.opentensor.ai:443";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120; // 2 minutes
pub const DEFAULT_CACHE_MAX_CAPACITY: u64 = 10_000;
pub const DEFAULT_LEDGER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SIDE_EFFECT_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_TASK_QUEUE_CAPACITY: usize = 1_024;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub subtensor_endpoint: String,
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,
    pub ledger_timeout: Duration,
    /// Bound for each cache/store/dispatch call
    pub side_effect_timeout: Duration,
    pub task_queue_capacity: usize,
    pub bind_addr: SocketAddr,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let subtensor_endpoint =
            get("SUBTENSOR_ENDPOINT").unwrap_or_else(|| DEFAULT_SUBTENSOR_ENDPOINT.to_string());

        let cache_ttl_secs = parse_or(get("CACHE_TTL"), "CACHE_TTL", DEFAULT_CACHE_TTL_SECS)?;
        let cache_max_capacity = parse_or(
            get("CACHE_MAX_CAPACITY"),
            "CACHE_MAX_CAPACITY",
            DEFAULT_CACHE_MAX_CAPACITY,
        )?;
        let ledger_timeout_secs = parse_or(
            get("LEDGER_TIMEOUT_SECS"),
            "LEDGER_TIMEOUT_SECS",
            DEFAULT_LEDGER_TIMEOUT_SECS,
        )?;
        let side_effect_timeout_ms = parse_or(
            get("SIDE_EFFECT_TIMEOUT_MS"),
            "SIDE_EFFECT_TIMEOUT_MS",
            DEFAULT_SIDE_EFFECT_TIMEOUT_MS,
        )?;
        let task_queue_capacity: usize = parse_or(
            get("TASK_QUEUE_CAPACITY"),
            "TASK_QUEUE_CAPACITY",
            DEFAULT_TASK_QUEUE_CAPACITY,
        )?;
        if task_queue_capacity == 0 {
            // tokio::sync::mpsc::channel panics on a zero bound
            return Err(ConfigError::Invalid {
                name: "TASK_QUEUE_CAPACITY",
                value: "0".to_string(),
            });
        }

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => parse("BIND_ADDR", &raw)?,
            None => parse("BIND_ADDR", DEFAULT_BIND_ADDR)?,
        };

        Ok(Self {
            database_url,
            subtensor_endpoint,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_max_capacity,
            ledger_timeout: Duration::from_secs(ledger_timeout_secs),
            side_effect_timeout: Duration::from_millis(side_effect_timeout_ms),
            task_queue_capacity,
            bind_addr,
        })
    }
}

fn parse<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => parse(name, &raw),
        None => Ok(default),
    }
}
