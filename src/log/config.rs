//! Configuration for a log node.

use std::time::Duration;

use crate::constants::{
    DEFAULT_FORWARD_TIMEOUT_MS, DEFAULT_MAX_CONCURRENT_POLL_READS, DEFAULT_STORE_TIMEOUT_MS,
    LIN_KV_SERVICE,
};
use crate::error::{Error, Result};

/// Configuration for a log node.
///
/// All values have working defaults; `from_env()` overrides them from the
/// environment for deployment-time tuning.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service id of the linearizable KV store.
    pub kv_service: String,

    /// Deadline for one store operation (read, write, or CAS).
    pub store_timeout: Duration,

    /// Deadline for forwarding a produce to the key's leader.
    ///
    /// Covers the leader's whole CAS loop plus the record write, so it
    /// should comfortably exceed `store_timeout`.
    pub forward_timeout: Duration,

    /// Maximum stream keys polled concurrently per poll request.
    pub max_concurrent_poll_reads: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            kv_service: LIN_KV_SERVICE.to_string(),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            forward_timeout: Duration::from_millis(DEFAULT_FORWARD_TIMEOUT_MS),
            max_concurrent_poll_reads: DEFAULT_MAX_CONCURRENT_POLL_READS,
        }
    }
}

impl LogConfig {
    /// Build a configuration from environment variables.
    ///
    /// - `KV_SERVICE`: store service id (default: `lin-kv`)
    /// - `STORE_TIMEOUT_MS`: per-operation store deadline
    /// - `FORWARD_TIMEOUT_MS`: leader-forwarding deadline
    /// - `MAX_CONCURRENT_POLL_READS`: poll fan-out cap
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            kv_service: std::env::var("KV_SERVICE").unwrap_or(defaults.kv_service),
            store_timeout: env_millis("STORE_TIMEOUT_MS")?
                .unwrap_or(defaults.store_timeout),
            forward_timeout: env_millis("FORWARD_TIMEOUT_MS")?
                .unwrap_or(defaults.forward_timeout),
            max_concurrent_poll_reads: env_parse("MAX_CONCURRENT_POLL_READS")?
                .unwrap_or(defaults.max_concurrent_poll_reads),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the rest of the crate assumes.
    pub fn validate(&self) -> Result<()> {
        if self.kv_service.is_empty() {
            return Err(Error::Config("kv_service must not be empty".to_string()));
        }
        if self.store_timeout.is_zero() {
            return Err(Error::Config("store_timeout must be positive".to_string()));
        }
        if self.forward_timeout.is_zero() {
            return Err(Error::Config("forward_timeout must be positive".to_string()));
        }
        if self.max_concurrent_poll_reads == 0 {
            return Err(Error::Config(
                "max_concurrent_poll_reads must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("invalid value for {name}: {raw:?}"))),
        Err(_) => Ok(None),
    }
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    Ok(env_parse::<u64>(name)?.map(Duration::from_millis))
}
