//! Reference range counting over a `BTreeSet`.

use std::collections::BTreeSet;
use std::ops::Bound;
use wiredbind_core::KeyBound;

fn to_bound(bound: Option<KeyBound<'_>>) -> Bound<&[u8]> {
    match bound {
        Some(b) if b.key().is_empty() => Bound::Unbounded,
        Some(b) if b.is_inclusive() => Bound::Included(b.key()),
        Some(b) => Bound::Excluded(b.key()),
        None => Bound::Unbounded,
    }
}

fn admits(key: &[u8], lower: Bound<&[u8]>, upper: Bound<&[u8]>) -> bool {
    let above = match lower {
        Bound::Included(l) => key >= l,
        Bound::Excluded(l) => key > l,
        Bound::Unbounded => true,
    };
    let below = match upper {
        Bound::Included(u) => key <= u,
        Bound::Excluded(u) => key < u,
        Bound::Unbounded => true,
    };
    above && below
}

/// Counts the keys of `keys` between `left` and `right`, with the same
/// conventions as [`Cursor::total_count`](wiredbind_core::Cursor::total_count).
pub fn oracle_count(
    keys: &BTreeSet<Vec<u8>>,
    left: Option<KeyBound<'_>>,
    right: Option<KeyBound<'_>>,
) -> u64 {
    let lower = to_bound(left);
    let upper = to_bound(right);
    keys.iter()
        .filter(|key| admits(key, lower, upper))
        .count() as u64
}

/// Borrows a generated `(key, inclusive)` pair as a [`KeyBound`].
pub fn as_key_bound(bound: &Option<(Vec<u8>, bool)>) -> Option<KeyBound<'_>> {
    bound.as_ref().map(|(key, inclusive)| {
        if *inclusive {
            KeyBound::inclusive(key)
        } else {
            KeyBound::exclusive(key)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(items: &[&str]) -> BTreeSet<Vec<u8>> {
        items.iter().map(|k| k.as_bytes().to_vec()).collect()
    }

    #[test]
    fn four_key_scenario() {
        let keys = keys(&["a", "b", "c", "d"]);
        let count = |l, r| oracle_count(&keys, l, r);
        assert_eq!(count(Some(KeyBound::inclusive("b")), Some(KeyBound::exclusive("d"))), 2);
        assert_eq!(count(Some(KeyBound::exclusive("d")), None), 0);
        assert_eq!(count(None, Some(KeyBound::exclusive("c"))), 2);
        assert_eq!(count(Some(KeyBound::inclusive("b")), Some(KeyBound::inclusive("c"))), 2);
        assert_eq!(count(Some(KeyBound::exclusive("b")), Some(KeyBound::exclusive("c"))), 0);
        assert_eq!(count(Some(KeyBound::exclusive("b")), Some(KeyBound::inclusive("d"))), 2);
    }

    #[test]
    fn inverted_bounds_count_zero() {
        let keys = keys(&["a", "b", "c"]);
        assert_eq!(
            oracle_count(&keys, Some(KeyBound::inclusive("c")), Some(KeyBound::inclusive("a"))),
            0
        );
    }
}
