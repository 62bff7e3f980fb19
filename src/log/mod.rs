//! The commit-log component.
//!
//! This module owns everything between the wire and the store:
//!
//! ```text
//!            ┌────────────┐
//!   client ─▶│  handlers  │──── leader? ──▶ allocator ──▶ lin-kv
//!            └─────┬──────┘                     │
//!                  │ not leader                 ▼
//!                  ▼                     ┌────────────┐
//!            internal_send ─▶ leader     │ local cache│
//!                                        └────────────┘
//! ```
//!
//! - [`router`]: deterministic key → leader mapping
//! - [`OffsetAllocator`]: CAS loop claiming offsets (leader only)
//! - [`LogCache`]: best-effort node-local record mirror
//! - [`KvStore`] / [`LinKv`]: typed client for the external store
//! - [`KvLogHandler`]: request handlers composing the above

mod allocator;
mod cache;
mod config;
mod handler;
pub mod keys;
pub mod router;
mod store;

#[cfg(any(test, feature = "test-utilities"))]
mod memory_kv;

pub use allocator::OffsetAllocator;
pub use cache::LogCache;
pub use config::LogConfig;
pub use handler::KvLogHandler;
#[cfg(any(test, feature = "test-utilities"))]
pub use memory_kv::MemoryKv;
pub use router::leader_for;
pub use store::{KvStore, LinKv};
