//! Property-based test generators using proptest.
//!
//! Keys are drawn from a small alphabet so that generated bounds often
//! coincide with stored keys, which is where range edges go wrong.

use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for a single non-empty key over `a..=e`.
pub fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(b'a'..=b'e', 1..4)
}

/// Strategy for a set of distinct keys.
pub fn key_set_strategy(max_len: usize) -> impl Strategy<Value = BTreeSet<Vec<u8>>> {
    prop::collection::btree_set(key_strategy(), 0..max_len)
}

/// Strategy for keys that may repeat, as a caller might insert them.
pub fn key_list_strategy(max_len: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(key_strategy(), 0..max_len)
}

/// Strategy for an optional range bound as `(key, inclusive)`.
pub fn bound_strategy() -> impl Strategy<Value = Option<(Vec<u8>, bool)>> {
    prop::option::of((key_strategy(), any::<bool>()))
}

/// Strategy for arbitrary values, including ones with NUL bytes.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..64)
}
