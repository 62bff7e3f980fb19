//! Crate & wire level errors.
//!
//! The crate uses a single flat error taxonomy. Every failure a handler can
//! hit maps onto one of four user-visible families:
//!
//! - [`Error::KeyNotFound`]: a store key was never written. Recoverable by
//!   lazy creation; callers decide whether it is an error at all (a missing
//!   counter just means an empty log).
//! - [`Error::PreconditionFailed`]: an optimistic-concurrency conflict. Always
//!   consumed by the CAS retry loops, never surfaced to a client.
//! - [`Error::Timeout`] / [`Error::Transport`]: the store or a peer is
//!   unreachable. Surfaced as a handler failure; nothing retries across nodes.
//! - [`Error::Malformed`] / [`Error::NotSupported`]: schema violations,
//!   surfaced immediately.
//!
//! [`Error::Rpc`] carries an error reply received from a peer or service
//! verbatim, so a forwarding node relays the leader's failure code unchanged.
//!
//! [`ErrorCode`] is the wire-level error vocabulary shared with the workbench
//! and the store service; `Error::code()` maps the taxonomy onto it when a
//! handler failure becomes an `error` reply.

use std::time::Duration;

use num_derive::FromPrimitive;
use thiserror::Error as ThisError;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures observable by request handlers and the transport.
#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum Error {
    /// A store key that was never written.
    #[error("key does not exist: {0}")]
    KeyNotFound(String),

    /// A compare-and-swap lost a race; the caller re-reads and retries.
    #[error("compare-and-swap conflict on {key}")]
    PreconditionFailed {
        /// Store key the CAS targeted.
        key: String,
    },

    /// An outbound RPC exceeded its deadline.
    #[error("request to {dest} timed out after {timeout:?}")]
    Timeout {
        /// Destination node or service.
        dest: String,
        /// Deadline that elapsed.
        timeout: Duration,
    },

    /// The substrate failed to deliver or returned something unintelligible.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A request body violated the protocol schema.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// A request type this node does not serve.
    #[error("unsupported request: {0}")]
    NotSupported(String),

    /// An error reply from a peer or service, relayed verbatim.
    #[error("remote error {code:?}: {text}")]
    Rpc {
        /// Wire code from the remote error body.
        code: ErrorCode,
        /// Human-readable detail from the remote error body.
        text: String,
    },

    /// Configuration error at startup.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Wire error code for this failure, used when building an `error` reply.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::KeyNotFound(_) => ErrorCode::KeyDoesNotExist,
            Error::PreconditionFailed { .. } => ErrorCode::PreconditionFailed,
            Error::Timeout { .. } => ErrorCode::Timeout,
            Error::Transport(_) | Error::Config(_) => ErrorCode::Crash,
            Error::Malformed(_) => ErrorCode::MalformedRequest,
            Error::NotSupported(_) => ErrorCode::NotSupported,
            // Relay the remote code unchanged.
            Error::Rpc { code, .. } => *code,
        }
    }

    /// Build an error from a remote `error` reply body.
    ///
    /// Unrecognized codes collapse to [`ErrorCode::Crash`], which is the
    /// "indefinite failure" bucket of the wire vocabulary.
    pub fn from_remote(code: i64, text: String) -> Self {
        use num_traits::FromPrimitive;
        Error::Rpc {
            code: ErrorCode::from_i64(code).unwrap_or(ErrorCode::Crash),
            text,
        }
    }
}

/// Wire protocol error codes.
///
/// These are the workbench's standard error codes; the store service replies
/// with the same vocabulary. See also the protocol's `error` body.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, Default)]
pub enum ErrorCode {
    /// The request timed out.
    Timeout = 0,
    /// The addressed node does not exist.
    NodeNotFound = 1,
    /// The request type is not supported by this node.
    NotSupported = 10,
    /// The operation cannot be performed right now; safe to retry.
    TemporarilyUnavailable = 11,
    /// The request body violated the schema.
    MalformedRequest = 12,
    /// Indefinite failure: the request may or may not have taken effect.
    #[default]
    Crash = 13,
    /// Definite failure: the request did not take effect.
    Abort = 14,
    /// The requested key does not exist.
    KeyDoesNotExist = 20,
    /// The key already exists and cannot be created.
    KeyAlreadyExists = 21,
    /// The expected value did not match the stored value.
    PreconditionFailed = 22,
    /// A transaction conflicted with another.
    TxnConflict = 30,
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::FromPrimitive;

    #[test]
    fn test_error_code_from_primitive() {
        assert_eq!(ErrorCode::from_i64(0), Some(ErrorCode::Timeout));
        assert_eq!(ErrorCode::from_i64(12), Some(ErrorCode::MalformedRequest));
        assert_eq!(ErrorCode::from_i64(20), Some(ErrorCode::KeyDoesNotExist));
        assert_eq!(ErrorCode::from_i64(22), Some(ErrorCode::PreconditionFailed));
        assert_eq!(ErrorCode::from_i64(999), None);
    }

    #[test]
    fn test_error_to_code_mapping() {
        assert_eq!(
            Error::KeyNotFound("counter:x".into()).code(),
            ErrorCode::KeyDoesNotExist
        );
        assert_eq!(
            Error::PreconditionFailed {
                key: "counter:x".into()
            }
            .code(),
            ErrorCode::PreconditionFailed
        );
        assert_eq!(
            Error::Timeout {
                dest: "lin-kv".into(),
                timeout: Duration::from_secs(1)
            }
            .code(),
            ErrorCode::Timeout
        );
        assert_eq!(Error::Malformed("no key".into()).code(), ErrorCode::MalformedRequest);
    }

    #[test]
    fn test_remote_error_code_relayed_verbatim() {
        let err = Error::from_remote(20, "key missing".into());
        assert_eq!(err.code(), ErrorCode::KeyDoesNotExist);

        // Unknown codes collapse to Crash.
        let err = Error::from_remote(77, "??".into());
        assert_eq!(err.code(), ErrorCode::Crash);
    }

    #[test]
    fn test_error_display() {
        let err = Error::Transport("stdout closed".into());
        assert!(err.to_string().contains("transport failure"));
        assert!(err.to_string().contains("stdout closed"));
    }
}
