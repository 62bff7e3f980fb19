//! Produce request handling.
//!
//! A produce may land on any node. The router decides local-vs-forward:
//! the key's leader allocates directly, everyone else issues a synchronous
//! `internal_send` to the leader and relays its answer, offset or error,
//! verbatim. There is no cross-node retry; a producer that times out may
//! re-send, and each attempt races independently for a new offset.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::Payload;
use crate::types::{Offset, StreamKey, Value};

use super::super::router;
use super::KvLogHandler;

/// Handle a produce from a client.
pub(super) async fn handle_send(
    handler: &KvLogHandler,
    key: StreamKey,
    msg: Value,
) -> Result<Offset> {
    let roster = handler.transport.roster();
    let leader = router::leader_for(&key, roster)
        .ok_or_else(|| Error::Transport("empty roster".to_string()))?;

    if leader == handler.transport.node_id() {
        return handler.allocator.allocate(&key, msg).await;
    }

    debug!(%key, %leader, "forwarding send to leader");
    let reply = handler
        .transport
        .rpc(
            leader,
            Payload::InternalSend {
                key: key.clone(),
                msg,
            },
            handler.config.forward_timeout,
        )
        .await?;

    match reply {
        Payload::InternalSendOk { offset } => Ok(offset),
        Payload::Error { code, text } => {
            warn!(%key, %leader, code, "leader rejected forwarded send");
            Err(Error::from_remote(code, text))
        }
        other => Err(Error::Transport(format!(
            "unexpected reply to internal_send: {}",
            other.kind()
        ))),
    }
}

/// Handle a produce forwarded by a non-leader peer.
pub(super) async fn handle_internal_send(
    handler: &KvLogHandler,
    key: StreamKey,
    msg: Value,
) -> Result<Offset> {
    handler.allocator.allocate(&key, msg).await
}
