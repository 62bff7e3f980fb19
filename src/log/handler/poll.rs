//! Poll request handling.
//!
//! Each requested key is scanned from its cursor up to the counter's
//! current value, consulting the local cache before the store. A record
//! that the counter promises but the store cannot read yet is "not yet
//! visible": the scan for that key stops early and the poller re-polls
//! from where it left off. The result per key is therefore an ascending,
//! contiguous run of records starting at the cursor.
//!
//! Keys fan out concurrently, bounded by `max_concurrent_poll_reads`.

use std::collections::HashMap;

use futures::stream::{self, StreamExt};

use crate::error::{Error, Result};
use crate::types::{Offset, Record, StreamKey};

use super::super::keys;
use super::KvLogHandler;

/// Handle a poll across one or more streams.
pub(super) async fn handle_poll(
    handler: &KvLogHandler,
    offsets: HashMap<StreamKey, Offset>,
) -> Result<HashMap<StreamKey, Vec<Record>>> {
    let results: Vec<(StreamKey, Result<Vec<Record>>)> =
        stream::iter(offsets.into_iter().map(|(key, start)| async move {
            let records = poll_key(handler, &key, start).await;
            (key, records)
        }))
        .buffer_unordered(handler.config.max_concurrent_poll_reads)
        .collect()
        .await;

    let mut msgs = HashMap::with_capacity(results.len());
    for (key, records) in results {
        msgs.insert(key, records?);
    }
    Ok(msgs)
}

/// Scan one stream from `start` up to its counter.
async fn poll_key(handler: &KvLogHandler, key: &str, start: Offset) -> Result<Vec<Record>> {
    // The counter is the upper bound of what may exist. No counter, no
    // records: the stream was never produced to.
    let upper = match handler.kv.read(&keys::counter_key(key)).await {
        Ok(v) => v,
        Err(Error::KeyNotFound(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut records = Vec::new();
    for off in start.value()..upper {
        let offset = Offset::new(off);
        if let Some(value) = handler.cache.get(key, offset) {
            records.push((offset, value));
            continue;
        }
        match handler.kv.read(&keys::record_key(key, offset)).await {
            Ok(value) => {
                handler.cache.record(key, offset, value);
                records.push((offset, value));
            }
            // Claimed but not yet written; everything past it is invisible
            // too, so stop this key here.
            Err(Error::KeyNotFound(_)) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}
