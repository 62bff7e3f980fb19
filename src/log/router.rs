//! Leader routing.
//!
//! Each stream key has exactly one node responsible for allocating its
//! offsets. The mapping is a pure function of the key and the fixed
//! roster (FNV-1a over the key bytes, reduced modulo the roster size),
//! so every node computes the same leader with no coordination.
//!
//! The roster is sorted once at init ([`crate::node::MaelstromNode`]), so
//! indexing is stable regardless of the order the workbench listed the
//! nodes. There is no rebalancing story: the roster is fixed for the
//! process lifetime.

use crate::types::NodeId;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a, 32-bit. Chosen for determinism across processes, not speed:
/// the default hasher is randomly seeded and would route differently on
/// every node.
pub(crate) fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// The node responsible for allocating offsets for `key`.
///
/// Returns `None` only for an empty roster, which a correctly initialized
/// node never has (the roster always includes itself).
pub fn leader_for<'a>(key: &str, roster: &'a [NodeId]) -> Option<&'a NodeId> {
    if roster.is_empty() {
        return None;
    }
    let idx = fnv1a(key.as_bytes()) as usize % roster.len();
    Some(&roster[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: usize) -> Vec<NodeId> {
        (0..n).map(|i| format!("n{i}")).collect()
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        // Published FNV-1a 32-bit test vectors.
        assert_eq!(fnv1a(b""), 0x811c_9dc5);
        assert_eq!(fnv1a(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_leader_is_deterministic() {
        let roster = roster(5);
        let first = leader_for("orders", &roster).unwrap();
        for _ in 0..100 {
            assert_eq!(leader_for("orders", &roster).unwrap(), first);
        }
    }

    #[test]
    fn test_leader_within_roster() {
        let roster = roster(3);
        for key in ["a", "b", "c", "x-7", "stream-42", ""] {
            let leader = leader_for(key, &roster).unwrap();
            assert!(roster.contains(leader));
        }
    }

    #[test]
    fn test_single_node_roster_owns_everything() {
        let roster = roster(1);
        assert_eq!(leader_for("anything", &roster).unwrap(), "n0");
        assert_eq!(leader_for("else", &roster).unwrap(), "n0");
    }

    #[test]
    fn test_empty_roster() {
        assert_eq!(leader_for("k", &[]), None);
    }

    #[test]
    fn test_keys_spread_across_roster() {
        // Not a distribution-quality test, just a sanity check that the
        // router is not collapsing every key onto one node.
        let roster = roster(5);
        let mut seen = std::collections::HashSet::new();
        for i in 0..100 {
            seen.insert(leader_for(&format!("key-{i}"), &roster).unwrap().clone());
        }
        assert!(seen.len() > 1, "all 100 keys routed to one node");
    }
}
