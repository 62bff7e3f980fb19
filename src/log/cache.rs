//! Node-local record cache.
//!
//! Every node mirrors the records it originates or observes, plus the
//! highest offset it knows about per stream, to keep poll requests off the
//! store where possible. The cache is strictly an optimization: it may be
//! stale or empty at any time and is never consulted for ownership or
//! allocation decisions. Entries are never evicted.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::{Offset, StreamKey, Value};

/// Best-effort mirror of (key, offset) → value and key → next offset.
///
/// Guarded by reader/writer locks: poll scans take shared reads, while
/// writes are short insertions. No lock is ever held across an await.
#[derive(Default)]
pub struct LogCache {
    records: RwLock<HashMap<StreamKey, HashMap<Offset, Value>>>,
    next_offsets: RwLock<HashMap<StreamKey, Offset>>,
}

impl LogCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a record and advance the stream's known watermark.
    pub fn record(&self, key: &str, offset: Offset, value: Value) {
        {
            let mut records = self.records.write().expect("record cache lock poisoned");
            records
                .entry(key.to_string())
                .or_default()
                .insert(offset, value);
        }

        let mut next_offsets = self
            .next_offsets
            .write()
            .expect("watermark cache lock poisoned");
        let next = next_offsets.entry(key.to_string()).or_default();
        if offset.next() > *next {
            *next = offset.next();
        }
    }

    /// Cached value at (key, offset), if this node has seen it.
    pub fn get(&self, key: &str, offset: Offset) -> Option<Value> {
        self.records
            .read()
            .expect("record cache lock poisoned")
            .get(key)
            .and_then(|log| log.get(&offset))
            .copied()
    }

    /// Offset one past the highest record this node has seen for `key`.
    pub fn next_offset(&self, key: &str) -> Option<Offset> {
        self.next_offsets
            .read()
            .expect("watermark cache lock poisoned")
            .get(key)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_cache_misses() {
        let cache = LogCache::new();
        assert_eq!(cache.get("x", Offset::new(0)), None);
        assert_eq!(cache.next_offset("x"), None);
    }

    #[test]
    fn test_record_and_get() {
        let cache = LogCache::new();
        cache.record("x", Offset::new(0), 10);
        cache.record("x", Offset::new(1), 20);
        cache.record("y", Offset::new(0), 30);

        assert_eq!(cache.get("x", Offset::new(0)), Some(10));
        assert_eq!(cache.get("x", Offset::new(1)), Some(20));
        assert_eq!(cache.get("y", Offset::new(0)), Some(30));
        assert_eq!(cache.get("x", Offset::new(2)), None);
    }

    #[test]
    fn test_watermark_never_regresses() {
        let cache = LogCache::new();
        cache.record("x", Offset::new(4), 40);
        assert_eq!(cache.next_offset("x"), Some(Offset::new(5)));

        // Observing an older record must not pull the watermark back.
        cache.record("x", Offset::new(1), 10);
        assert_eq!(cache.next_offset("x"), Some(Offset::new(5)));
    }

    #[test]
    fn test_streams_are_independent() {
        let cache = LogCache::new();
        cache.record("x", Offset::new(0), 1);
        assert_eq!(cache.next_offset("y"), None);
        assert_eq!(cache.get("y", Offset::new(0)), None);
    }
}
