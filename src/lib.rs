//! # Linlog
//! A node in a replicated, partitioned event log, built on an external
//! linearizable key-value store and a peer-to-peer message substrate.
//!
//! Each node accepts produce requests for logical streams, assigns every
//! accepted record a unique, densely increasing per-key offset, answers
//! poll requests from a cursor, and tracks consumer-committed offsets.
//! Offset allocation for a key is owned by exactly one node, chosen by a
//! deterministic hash of the key over the fixed roster, so there is no
//! central sequencer and no cross-node locking; the store's
//! compare-and-swap is the only linearization point.
//!
//! # Goals
//! - Easy to understand code
//! - Correct offset allocation under arbitrary request interleavings
//! - Leverage best in class libraries such as [Tokio](https://tokio.rs/)
//!   and [Serde](https://serde.rs/)
//!
//! # Running a node
//!
//! The binary speaks newline-delimited JSON on stdin/stdout under the
//! [Maelstrom](https://github.com/jepsen-io/maelstrom) workbench:
//!
//! ```bash
//! maelstrom test -w kafka --bin target/release/linlog \
//!     --node-count 3 --concurrency 2n --time-limit 20 --rate 1000
//! ```
//!
//! # Embedding
//!
//! The substrate and the store are trait seams ([`node::Transport`],
//! [`log::KvStore`]), so the handler stack can be driven entirely
//! in-process:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use linlog::log::{KvLogHandler, LinKv, LogConfig};
//! use linlog::node::MaelstromNode;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LogConfig::from_env()?;
//!     let (node, runner) = MaelstromNode::start().await?;
//!     let kv = Arc::new(LinKv::new(node.clone(), &config));
//!     let handler = Arc::new(KvLogHandler::new(node, kv, config));
//!     runner.serve(handler).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

pub mod constants;
pub mod error;
pub mod log;
pub mod node;
pub mod protocol;
pub mod telemetry;
pub mod types;

pub mod prelude {
    //! Main exports for building or embedding a log node.
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::log::{KvLogHandler, KvStore, LinKv, LogCache, LogConfig};
    pub use crate::node::{Handler, MaelstromNode, Transport};
    pub use crate::protocol::{Body, Message, Payload};
    pub use crate::types::{NodeId, Offset, Record, StreamKey, Value};
}
