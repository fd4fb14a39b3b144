//! Collection types for meshcombine.
//!
//! - Re-exports of hash collections using AHash
//! - Insertion-ordered maps and sets sharing the same hasher

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

/// Insertion-ordered map hashed with AHash.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, RandomState>;

/// Insertion-ordered set hashed with AHash.
pub type IndexSet<T> = indexmap::IndexSet<T, RandomState>;

/// Fixed seeds for hashes that must be identical across runs.
const STABLE_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

/// A hasher builder whose output does not change between runs of the same build.
pub fn stable_state() -> RandomState {
    let [a, b, c, d] = STABLE_SEEDS;
    RandomState::with_seeds(a, b, c, d)
}

/// Create an empty [`IndexMap`].
pub fn index_map<K, V>() -> IndexMap<K, V> {
    IndexMap::with_hasher(RandomState::new())
}

/// Create an empty [`IndexSet`].
pub fn index_set<T>() -> IndexSet<T> {
    IndexSet::with_hasher(RandomState::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::BuildHasher;

    #[test]
    fn test_hashmap_ahash() {
        let mut map = HashMap::new();
        map.insert("key", "value");
        assert_eq!(map.get("key"), Some(&"value"));
    }

    #[test]
    fn test_index_map_keeps_insertion_order() {
        let mut map = index_map();
        map.insert("c", 3);
        map.insert("a", 1);
        map.insert("b", 2);
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_index_set_ignores_duplicates() {
        let mut set = index_set();
        assert!(set.insert(7));
        assert!(!set.insert(7));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_stable_state_is_repeatable() {
        let first = stable_state().hash_one(42u64);
        let second = stable_state().hash_one(42u64);
        assert_eq!(first, second);
    }
}
