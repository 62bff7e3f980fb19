//! Typed client for the external linearizable key-value store.
//!
//! [`KvStore`] is the contract the rest of the crate programs against:
//! three operations, four distinguishable outcomes (ok, key-not-found,
//! precondition-failed, timeout/transport). The client never retries;
//! retry policy belongs to the CAS loops that call it.
//!
//! [`LinKv`] is the production implementation, speaking the store protocol
//! to the `lin-kv` service over a [`Transport`]. The in-memory
//! [`MemoryKv`](super::MemoryKv) implements the same trait for tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::error::{Error, ErrorCode, Result};
use crate::node::Transport;
use crate::protocol::Payload;

use super::config::LogConfig;

/// Read/write/CAS contract of the backing store.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the value at `key`; [`Error::KeyNotFound`] if never written.
    async fn read(&self, key: &str) -> Result<i64>;

    /// Unconditionally overwrite `key`.
    async fn write(&self, key: &str, value: i64) -> Result<()>;

    /// Write `to` only if the current value matches `from`.
    ///
    /// `from: None` is the absent sentinel: the write succeeds only if the
    /// key was never written, creating it. `from: Some(v)` fails with
    /// [`Error::PreconditionFailed`] when the stored value is not `v`, and
    /// with [`Error::KeyNotFound`] when the key does not exist.
    async fn cas(&self, key: &str, from: Option<i64>, to: i64) -> Result<()>;
}

/// Store client backed by the linearizable KV service.
pub struct LinKv {
    transport: Arc<dyn Transport>,
    service: String,
    timeout: Duration,
}

impl LinKv {
    /// Create a client using the service id and deadline from `config`.
    pub fn new(transport: Arc<dyn Transport>, config: &LogConfig) -> Self {
        Self {
            transport,
            service: config.kv_service.clone(),
            timeout: config.store_timeout,
        }
    }

    async fn call(&self, key: &str, request: Payload) -> Result<Payload> {
        let kind = request.kind();
        trace!(key, kind, "store call");
        let reply = self
            .transport
            .rpc(&self.service, request, self.timeout)
            .await?;
        match reply {
            Payload::Error { code, text } => Err(store_error(key, code, text)),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl KvStore for LinKv {
    async fn read(&self, key: &str) -> Result<i64> {
        match self
            .call(key, Payload::Read { key: key.to_string() })
            .await?
        {
            Payload::ReadOk { value } => Ok(value),
            other => Err(unexpected_reply("read", &other)),
        }
    }

    async fn write(&self, key: &str, value: i64) -> Result<()> {
        match self
            .call(
                key,
                Payload::Write {
                    key: key.to_string(),
                    value,
                },
            )
            .await?
        {
            Payload::WriteOk => Ok(()),
            other => Err(unexpected_reply("write", &other)),
        }
    }

    async fn cas(&self, key: &str, from: Option<i64>, to: i64) -> Result<()> {
        let create_if_not_exists = from.is_none();
        match self
            .call(
                key,
                Payload::Cas {
                    key: key.to_string(),
                    from,
                    to,
                    create_if_not_exists,
                },
            )
            .await?
        {
            Payload::CasOk => Ok(()),
            other => Err(unexpected_reply("cas", &other)),
        }
    }
}

/// Map a store `error` reply into the crate taxonomy.
fn store_error(key: &str, code: i64, text: String) -> Error {
    use num_traits::FromPrimitive;
    match ErrorCode::from_i64(code) {
        Some(ErrorCode::KeyDoesNotExist) => Error::KeyNotFound(key.to_string()),
        Some(ErrorCode::PreconditionFailed) => Error::PreconditionFailed {
            key: key.to_string(),
        },
        _ => Error::from_remote(code, text),
    }
}

fn unexpected_reply(op: &str, reply: &Payload) -> Error {
    Error::Transport(format!("unexpected reply to {op}: {}", reply.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        assert_eq!(
            store_error("counter:x", 20, "not found".into()),
            Error::KeyNotFound("counter:x".to_string())
        );
        assert_eq!(
            store_error("counter:x", 22, "expected 3".into()),
            Error::PreconditionFailed {
                key: "counter:x".to_string()
            }
        );
        // Anything else passes through as a remote error.
        let err = store_error("counter:x", 11, "unavailable".into());
        assert_eq!(err.code(), ErrorCode::TemporarilyUnavailable);
    }
}
