//! Request dispatch trait.
//!
//! [`Handler`] has one method per request type in the client and peer
//! protocols. Defaults reject with [`Error::NotSupported`], so a handler
//! implements exactly the surface it serves.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::protocol::Payload;
use crate::types::{Offset, Record, StreamKey, Value};

/// Per-request-type handler methods.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Produce a record to a stream, returning its assigned offset.
    async fn handle_send(&self, _key: StreamKey, _msg: Value) -> Result<Offset> {
        Err(Error::NotSupported("send".to_string()))
    }

    /// Peer-only produce on behalf of a non-leader node.
    async fn handle_internal_send(&self, _key: StreamKey, _msg: Value) -> Result<Offset> {
        Err(Error::NotSupported("internal_send".to_string()))
    }

    /// Read records at or after each key's cursor.
    async fn handle_poll(
        &self,
        _offsets: HashMap<StreamKey, Offset>,
    ) -> Result<HashMap<StreamKey, Vec<Record>>> {
        Err(Error::NotSupported("poll".to_string()))
    }

    /// Advance consumer-committed offsets.
    async fn handle_commit_offsets(&self, _offsets: HashMap<StreamKey, Offset>) -> Result<()> {
        Err(Error::NotSupported("commit_offsets".to_string()))
    }

    /// Fetch committed offsets; keys never committed are omitted.
    async fn handle_list_committed_offsets(
        &self,
        _keys: Vec<StreamKey>,
    ) -> Result<HashMap<StreamKey, Offset>> {
        Err(Error::NotSupported("list_committed_offsets".to_string()))
    }
}

/// Route a request payload to its handler method and wrap the result in
/// the matching `_ok` payload.
pub async fn dispatch<H: Handler + ?Sized>(handler: &H, payload: Payload) -> Result<Payload> {
    match payload {
        Payload::Send { key, msg } => handler
            .handle_send(key, msg)
            .await
            .map(|offset| Payload::SendOk { offset }),
        Payload::InternalSend { key, msg } => handler
            .handle_internal_send(key, msg)
            .await
            .map(|offset| Payload::InternalSendOk { offset }),
        Payload::Poll { offsets } => handler
            .handle_poll(offsets)
            .await
            .map(|msgs| Payload::PollOk { msgs }),
        Payload::CommitOffsets { offsets } => handler
            .handle_commit_offsets(offsets)
            .await
            .map(|()| Payload::CommitOffsetsOk),
        Payload::ListCommittedOffsets { keys } => handler
            .handle_list_committed_offsets(keys)
            .await
            .map(|offsets| Payload::ListCommittedOffsetsOk { offsets }),
        other => Err(Error::NotSupported(other.kind().to_string())),
    }
}
