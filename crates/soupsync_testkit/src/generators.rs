//! Property-based test generators using proptest.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

/// Strategy for generating remote-style record ids.
pub fn record_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9]{15}").expect("Invalid regex")
}

/// Strategy for generating a set of distinct record ids.
pub fn id_set_strategy(max: usize) -> impl Strategy<Value = HashSet<String>> {
    prop::collection::hash_set(record_id_strategy(), 0..=max)
}

/// Strategy for generating batch sizes.
pub fn batch_size_strategy() -> impl Strategy<Value = usize> {
    1usize..=64
}

/// Strategy for generating local ids together with the subset deleted
/// remotely.
///
/// Ids come out sorted so fixtures built from them are deterministic.
pub fn deletion_scenario_strategy(max: usize) -> impl Strategy<Value = (Vec<String>, BTreeSet<String>)> {
    prop::collection::btree_set(record_id_strategy(), 0..=max).prop_flat_map(|ids| {
        let ids: Vec<String> = ids.into_iter().collect();
        let len = ids.len();
        (Just(ids), prop::collection::vec(any::<bool>(), len)).prop_map(|(ids, deleted)| {
            let gone = ids
                .iter()
                .zip(deleted)
                .filter(|(_, deleted)| *deleted)
                .map(|(id, _)| id.clone())
                .collect();
            (ids, gone)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn ids_are_quotable(id in record_id_strategy()) {
            prop_assert_eq!(id.len(), 15);
            prop_assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        }

        #[test]
        fn deletions_are_a_subset((ids, gone) in deletion_scenario_strategy(30)) {
            prop_assert!(gone.iter().all(|id| ids.contains(id)));
            prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
