//! Crate-wide default values.

/// Well-known id of the linearizable key-value service.
pub const LIN_KV_SERVICE: &str = "lin-kv";

/// Default deadline for one store operation, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 1_000;

/// Default deadline for forwarding a produce to the key's leader, in
/// milliseconds. Longer than the store deadline: the leader's CAS loop may
/// itself need several store round trips under contention.
pub const DEFAULT_FORWARD_TIMEOUT_MS: u64 = 2_500;

/// Default cap on concurrently polled stream keys per poll request.
pub const DEFAULT_MAX_CONCURRENT_POLL_READS: usize = 16;
