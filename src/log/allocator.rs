//! Offset allocation.
//!
//! The allocator claims the next offset for a stream by advancing its
//! counter entry with a compare-and-swap, then durably writes the record.
//! It runs only on the key's leader; the store's CAS is the single
//! linearization point, so exactly one claimant wins each offset and the
//! sequence is gapless from 0.
//!
//! The counter CAS commits before the record write lands, so a poller can
//! briefly observe the counter ahead of a readable record. Poll treats
//! that missing record as "not yet visible" and stops early rather than
//! erroring; see [`super::handler`].

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Offset, Value};

use super::cache::LogCache;
use super::keys;
use super::store::KvStore;

/// Leader-side offset allocator.
pub struct OffsetAllocator {
    kv: Arc<dyn KvStore>,
    cache: Arc<LogCache>,
}

impl OffsetAllocator {
    /// Create an allocator over the given store and cache.
    pub fn new(kv: Arc<dyn KvStore>, cache: Arc<LogCache>) -> Self {
        Self { kv, cache }
    }

    /// Claim the next offset for `key` and durably write the record.
    ///
    /// Retries the CAS until it wins or hits a non-conflict error. The
    /// loop is unbounded with no backoff: only forwarded requests from
    /// non-leader peers compete for a key, never two leaders, so
    /// contention is light and short-lived.
    pub async fn allocate(&self, key: &str, value: Value) -> Result<Offset> {
        let counter_key = keys::counter_key(key);
        loop {
            // A missing counter means no record was ever produced; claim
            // from a virtual 0 and create the entry atomically.
            let current = match self.kv.read(&counter_key).await {
                Ok(v) => Some(v),
                Err(Error::KeyNotFound(_)) => None,
                Err(e) => return Err(e),
            };
            let claimed = current.unwrap_or(0);

            match self.kv.cas(&counter_key, current, claimed + 1).await {
                Ok(()) => {
                    let offset = Offset::new(claimed);
                    self.kv.write(&keys::record_key(key, offset), value).await?;
                    self.cache.record(key, offset, value);
                    debug!(key, %offset, "offset claimed");
                    return Ok(offset);
                }
                Err(Error::PreconditionFailed { .. }) => {
                    debug!(key, claimed, "lost offset race, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
