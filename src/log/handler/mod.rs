//! Log node handler implementing the node [`Handler`] trait.
//!
//! This module is split by handler category:
//! - `produce` - send and internal_send handling
//! - `poll` - poll handling
//! - `offsets` - offset commit and listing

mod offsets;
mod poll;
mod produce;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::node::{Handler, Transport};
use crate::types::{Offset, Record, StreamKey, Value};

use super::allocator::OffsetAllocator;
use super::cache::LogCache;
use super::config::LogConfig;
use super::store::KvStore;

/// Commit-log handler backed by the external KV store.
///
/// One instance serves all streams on a node. Everything it composes is
/// injected: the transport (for leader forwarding), the store, and the
/// shared record cache.
pub struct KvLogHandler {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) kv: Arc<dyn KvStore>,
    pub(crate) cache: Arc<LogCache>,
    pub(crate) allocator: OffsetAllocator,
    pub(crate) config: LogConfig,
}

impl KvLogHandler {
    /// Create a handler over the given transport and store.
    pub fn new(transport: Arc<dyn Transport>, kv: Arc<dyn KvStore>, config: LogConfig) -> Self {
        let cache = Arc::new(LogCache::new());
        let allocator = OffsetAllocator::new(Arc::clone(&kv), Arc::clone(&cache));
        Self {
            transport,
            kv,
            cache,
            allocator,
            config,
        }
    }
}

#[async_trait]
impl Handler for KvLogHandler {
    async fn handle_send(&self, key: StreamKey, msg: Value) -> Result<Offset> {
        produce::handle_send(self, key, msg).await
    }

    async fn handle_internal_send(&self, key: StreamKey, msg: Value) -> Result<Offset> {
        produce::handle_internal_send(self, key, msg).await
    }

    async fn handle_poll(
        &self,
        offsets: HashMap<StreamKey, Offset>,
    ) -> Result<HashMap<StreamKey, Vec<Record>>> {
        poll::handle_poll(self, offsets).await
    }

    async fn handle_commit_offsets(&self, offsets: HashMap<StreamKey, Offset>) -> Result<()> {
        offsets::handle_commit_offsets(self, offsets).await
    }

    async fn handle_list_committed_offsets(
        &self,
        keys: Vec<StreamKey>,
    ) -> Result<HashMap<StreamKey, Offset>> {
        offsets::handle_list_committed_offsets(self, keys).await
    }
}
