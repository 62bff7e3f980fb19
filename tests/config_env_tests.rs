//! Integration tests for LogConfig::from_env().
//!
//! Environment variables are process-global, so every test serializes on
//! a static mutex and restores the variables it touched.

use std::env;
use std::sync::Mutex;
use std::time::Duration;

use linlog::log::LogConfig;

/// Global mutex to serialize all env-based tests.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// All environment variables read by LogConfig::from_env().
const ALL_CONFIG_ENV_VARS: &[&str] = &[
    "KV_SERVICE",
    "STORE_TIMEOUT_MS",
    "FORWARD_TIMEOUT_MS",
    "MAX_CONCURRENT_POLL_READS",
];

/// Run `f` with a clean config environment, restoring prior values after.
fn with_clean_env<F: FnOnce()>(f: F) {
    let _guard = ENV_MUTEX.lock().unwrap();
    let saved: Vec<(&str, Option<String>)> = ALL_CONFIG_ENV_VARS
        .iter()
        .map(|&name| (name, env::var(name).ok()))
        .collect();
    for name in ALL_CONFIG_ENV_VARS {
        env::remove_var(name);
    }

    f();

    for (name, value) in saved {
        match value {
            Some(value) => env::set_var(name, value),
            None => env::remove_var(name),
        }
    }
}

#[test]
fn test_defaults_when_env_unset() {
    with_clean_env(|| {
        let config = LogConfig::from_env().unwrap();
        assert_eq!(config.kv_service, "lin-kv");
        assert_eq!(config.store_timeout, Duration::from_millis(1_000));
        assert_eq!(config.forward_timeout, Duration::from_millis(2_500));
        assert_eq!(config.max_concurrent_poll_reads, 16);
    });
}

#[test]
fn test_env_overrides_are_honored() {
    with_clean_env(|| {
        env::set_var("KV_SERVICE", "seq-kv");
        env::set_var("STORE_TIMEOUT_MS", "250");
        env::set_var("FORWARD_TIMEOUT_MS", "750");
        env::set_var("MAX_CONCURRENT_POLL_READS", "4");

        let config = LogConfig::from_env().unwrap();
        assert_eq!(config.kv_service, "seq-kv");
        assert_eq!(config.store_timeout, Duration::from_millis(250));
        assert_eq!(config.forward_timeout, Duration::from_millis(750));
        assert_eq!(config.max_concurrent_poll_reads, 4);
    });
}

#[test]
fn test_unparseable_value_is_rejected() {
    with_clean_env(|| {
        env::set_var("STORE_TIMEOUT_MS", "soon");
        let err = LogConfig::from_env().expect_err("garbage must not parse");
        assert!(err.to_string().contains("STORE_TIMEOUT_MS"));
    });
}

#[test]
fn test_zero_fanout_fails_validation() {
    with_clean_env(|| {
        env::set_var("MAX_CONCURRENT_POLL_READS", "0");
        assert!(LogConfig::from_env().is_err());
    });
}
