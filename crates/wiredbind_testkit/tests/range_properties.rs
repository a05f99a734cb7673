//! Range counting checked against a reference counter.

use proptest::prelude::*;
use std::collections::BTreeSet;
use wiredbind_core::KeyBound;
use wiredbind_testkit::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn unbounded_count_is_distinct_keys(keys in key_list_strategy(40)) {
        let distinct: BTreeSet<_> = keys.iter().cloned().collect();
        let count = with_test_cursor(|cursor| {
            populate(cursor, &keys);
            cursor.total_count(None, None).unwrap()
        });
        prop_assert_eq!(count, distinct.len() as u64);
    }

    #[test]
    fn inclusive_left_counts_at_least_exclusive(
        keys in key_set_strategy(30),
        left in key_strategy(),
    ) {
        let (inclusive, exclusive) = with_test_cursor(|cursor| {
            populate(cursor, &keys);
            (
                cursor.total_count(Some(KeyBound::inclusive(&left)), None).unwrap(),
                cursor.total_count(Some(KeyBound::exclusive(&left)), None).unwrap(),
            )
        });
        prop_assert!(inclusive >= exclusive);
        prop_assert_eq!(inclusive == exclusive, !keys.contains(&left));
        if keys.contains(&left) {
            prop_assert_eq!(inclusive, exclusive + 1);
        }
    }

    #[test]
    fn count_matches_oracle(
        keys in key_set_strategy(30),
        left in bound_strategy(),
        right in bound_strategy(),
    ) {
        let count = with_test_cursor(|cursor| {
            populate(cursor, &keys);
            cursor.total_count(as_key_bound(&left), as_key_bound(&right)).unwrap()
        });
        prop_assert_eq!(count, oracle_count(&keys, as_key_bound(&left), as_key_bound(&right)));
    }

    #[test]
    fn count_leaves_cursor_reusable(
        keys in key_set_strategy(20),
        left in bound_strategy(),
    ) {
        let listed = with_test_cursor(|cursor| {
            populate(cursor, &keys);
            cursor.total_count(as_key_bound(&left), None).unwrap();
            prop_assert_eq!(cursor.current().unwrap(), None);
            Ok(collect_keys(cursor))
        })?;
        let expected: Vec<_> = keys.into_iter().collect();
        prop_assert_eq!(listed, expected);
    }

    #[test]
    fn values_round_trip(key in key_strategy(), value in value_strategy()) {
        let stored = with_test_cursor(|cursor| {
            cursor.insert(&key, &value).unwrap();
            prop_assert!(cursor.search(&key).unwrap());
            Ok((cursor.key().unwrap(), cursor.value().unwrap()))
        })?;
        prop_assert_eq!(stored, (key, value));
    }
}

#[test]
fn four_key_scenario() {
    let count = with_test_cursor(|cursor| {
        populate(cursor, ["a", "b", "c", "d"]);
        [
            cursor.total_count(Some(KeyBound::inclusive("b")), Some(KeyBound::exclusive("d"))),
            cursor.total_count(Some(KeyBound::exclusive("d")), None),
            cursor.total_count(None, Some(KeyBound::exclusive("c"))),
        ]
        .map(Result::unwrap)
    });
    assert_eq!(count, [2, 0, 2]);
}

#[test]
fn four_key_bounds_on_stored_keys() {
    let count = with_test_cursor(|cursor| {
        populate(cursor, ["a", "b", "c", "d"]);
        [
            cursor.total_count(Some(KeyBound::inclusive("b")), Some(KeyBound::inclusive("c"))),
            cursor.total_count(Some(KeyBound::exclusive("b")), Some(KeyBound::exclusive("c"))),
            cursor.total_count(Some(KeyBound::exclusive("b")), Some(KeyBound::inclusive("d"))),
            cursor.total_count(Some(KeyBound::exclusive("bb")), None),
            cursor.total_count(Some(KeyBound::exclusive("z")), None),
            cursor.total_count(Some(KeyBound::inclusive("0")), Some(KeyBound::inclusive("0"))),
        ]
        .map(Result::unwrap)
    });
    assert_eq!(count, [2, 0, 2, 2, 0, 0]);
}

#[test]
fn count_on_large_table() {
    let mut store = scenarios::numbered_store(1_000);
    let mut cursor = store.cursor();
    assert_eq!(cursor.total_count_range("00000100".."00000200").unwrap(), 100);
    assert_eq!(cursor.total_count_range("00000990"..).unwrap(), 10);
    assert_eq!(cursor.total_count_range(..="00000009").unwrap(), 10);
}
