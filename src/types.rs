//! Type-safe wrappers for log protocol primitives.
//!
//! These aliases and newtypes keep the integer soup of the wire protocol
//! readable: an offset, a payload value, and a node identity all serialize
//! as plain JSON scalars but mean very different things.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical log name; the partition unit.
///
/// Keys are opaque to the node: they are hashed for leader routing and
/// embedded in store key names, never interpreted.
pub type StreamKey = String;

/// Opaque record payload.
///
/// The workload produces small integers; the type is wide enough to
/// generalize to any scalar payload without changing the wire shape.
pub type Value = i64;

/// Identity of a node in the roster (e.g. `"n0"`).
pub type NodeId = String;

/// Position of a record within a stream's log.
///
/// Offsets are non-negative and densely increasing from 0 per stream key;
/// each offset is assigned to exactly one record. The representation is a
/// signed 64-bit integer for wire compatibility; negative values never
/// appear in a successfully allocated offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Offset(pub i64);

impl Offset {
    /// Create a new offset from a raw value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Offset(value)
    }

    /// Get the raw i64 value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// The offset immediately after this one.
    #[inline]
    pub const fn next(self) -> Self {
        Offset(self.0 + 1)
    }
}

impl From<i64> for Offset {
    fn from(value: i64) -> Self {
        Offset(value)
    }
}

impl From<Offset> for i64 {
    fn from(offset: Offset) -> Self {
        offset.0
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A record as it appears on the wire: `[offset, value]`.
pub type Record = (Offset, Value);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_next() {
        assert_eq!(Offset::new(0).next(), Offset::new(1));
        assert_eq!(Offset::new(41).next().value(), 42);
    }

    #[test]
    fn test_offset_ordering() {
        assert!(Offset::new(1) < Offset::new(2));
        assert_eq!(Offset::new(7), Offset::from(7));
    }

    #[test]
    fn test_offset_serializes_transparently() {
        let json = serde_json::to_string(&Offset::new(5)).unwrap();
        assert_eq!(json, "5");
        let offset: Offset = serde_json::from_str("12").unwrap();
        assert_eq!(offset, Offset::new(12));
    }

    #[test]
    fn test_record_serializes_as_pair() {
        let record: Record = (Offset::new(3), 99);
        assert_eq!(serde_json::to_string(&record).unwrap(), "[3,99]");
    }

    #[test]
    fn test_offset_display() {
        assert_eq!(Offset::new(17).to_string(), "17");
    }
}
