//! In-memory store for testing.
//!
//! Implements [`KvStore`] with the same observable semantics as the real
//! service: distinguishable not-found and precondition-failed outcomes,
//! and linearizable CAS (every operation runs under one mutex).
//!
//! This module is available during unit tests or with the
//! `test-utilities` feature:
//!
//! ```toml
//! [dev-dependencies]
//! linlog = { path = ".", features = ["test-utilities"] }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::store::KvStore;

/// In-memory [`KvStore`] with injectable CAS conflicts.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, i64>>,
    forced_cas_conflicts: AtomicUsize,
}

impl MemoryKv {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` CAS attempts fail with a precondition conflict,
    /// regardless of the stored value. Exercises the callers' retry loops
    /// without needing a real concurrent writer.
    pub fn inject_cas_conflicts(&self, n: usize) {
        self.forced_cas_conflicts.fetch_add(n, Ordering::SeqCst);
    }

    /// Current value at `key`, bypassing the trait's error mapping.
    pub fn get(&self, key: &str) -> Option<i64> {
        self.entries
            .lock()
            .expect("memory kv lock poisoned")
            .get(key)
            .copied()
    }

    fn take_forced_conflict(&self) -> bool {
        self.forced_cas_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn read(&self, key: &str) -> Result<i64> {
        self.get(key)
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))
    }

    async fn write(&self, key: &str, value: i64) -> Result<()> {
        self.entries
            .lock()
            .expect("memory kv lock poisoned")
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn cas(&self, key: &str, from: Option<i64>, to: i64) -> Result<()> {
        if self.take_forced_conflict() {
            return Err(Error::PreconditionFailed {
                key: key.to_string(),
            });
        }
        let mut entries = self.entries.lock().expect("memory kv lock poisoned");
        match (entries.get(key).copied(), from) {
            (None, None) => {
                entries.insert(key.to_string(), to);
                Ok(())
            }
            (Some(current), Some(expected)) if current == expected => {
                entries.insert(key.to_string(), to);
                Ok(())
            }
            (Some(_), Some(_)) | (Some(_), None) => Err(Error::PreconditionFailed {
                key: key.to_string(),
            }),
            (None, Some(_)) => Err(Error::KeyNotFound(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let kv = MemoryKv::new();
        assert_eq!(
            kv.read("k").await,
            Err(Error::KeyNotFound("k".to_string()))
        );
    }

    #[tokio::test]
    async fn test_cas_create_then_advance() {
        let kv = MemoryKv::new();
        kv.cas("k", None, 1).await.unwrap();
        assert_eq!(kv.read("k").await.unwrap(), 1);

        kv.cas("k", Some(1), 2).await.unwrap();
        assert_eq!(kv.read("k").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_cas_create_loses_to_existing_key() {
        let kv = MemoryKv::new();
        kv.write("k", 5).await.unwrap();
        assert_eq!(
            kv.cas("k", None, 1).await,
            Err(Error::PreconditionFailed {
                key: "k".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_cas_stale_expectation_conflicts() {
        let kv = MemoryKv::new();
        kv.write("k", 5).await.unwrap();
        assert_eq!(
            kv.cas("k", Some(4), 6).await,
            Err(Error::PreconditionFailed {
                key: "k".to_string()
            })
        );
        // Value untouched by the failed CAS.
        assert_eq!(kv.read("k").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_cas_on_missing_key_is_not_found() {
        let kv = MemoryKv::new();
        assert_eq!(
            kv.cas("k", Some(1), 2).await,
            Err(Error::KeyNotFound("k".to_string()))
        );
    }

    #[tokio::test]
    async fn test_injected_conflicts_drain() {
        let kv = MemoryKv::new();
        kv.inject_cas_conflicts(2);
        assert!(kv.cas("k", None, 1).await.is_err());
        assert!(kv.cas("k", None, 1).await.is_err());
        assert!(kv.cas("k", None, 1).await.is_ok());
    }
}
