//! Offset commit and listing.
//!
//! Committed offsets advance with monotone-max semantics: a commit at or
//! below the stored value is a successful no-op, so a slow consumer can
//! never roll a group's progress backwards. The entry is created lazily on
//! first commit; listing omits keys that were never committed rather than
//! zero-filling them.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Offset, StreamKey};

use super::super::keys::commit_key;
use super::KvLogHandler;

/// Handle a commit across one or more streams.
pub(super) async fn handle_commit_offsets(
    handler: &KvLogHandler,
    offsets: HashMap<StreamKey, Offset>,
) -> Result<()> {
    for (key, requested) in offsets {
        commit_one(handler, &key, requested).await?;
    }
    Ok(())
}

/// Monotone-max CAS loop for one stream's committed offset.
async fn commit_one(handler: &KvLogHandler, key: &str, requested: Offset) -> Result<()> {
    let entry_key = commit_key(key);
    loop {
        let current = match handler.kv.read(&entry_key).await {
            Ok(v) => Some(v),
            Err(Error::KeyNotFound(_)) => None,
            Err(e) => return Err(e),
        };

        if let Some(stored) = current {
            if requested.value() <= stored {
                // Equal or older commit: already satisfied.
                return Ok(());
            }
        }

        match handler.kv.cas(&entry_key, current, requested.value()).await {
            Ok(()) => {
                debug!(key, %requested, "committed offset advanced");
                return Ok(());
            }
            Err(Error::PreconditionFailed { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Handle a committed-offset listing.
pub(super) async fn handle_list_committed_offsets(
    handler: &KvLogHandler,
    requested: Vec<StreamKey>,
) -> Result<HashMap<StreamKey, Offset>> {
    let mut offsets = HashMap::with_capacity(requested.len());
    for key in requested {
        match handler.kv.read(&commit_key(&key)).await {
            Ok(v) => {
                offsets.insert(key, Offset::new(v));
            }
            // Never committed: omitted, never zero-filled.
            Err(Error::KeyNotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(offsets)
}
