//! Property test over `DataStore::get_partition_value`'s split invariant:
//! whatever dimension and pivot it picks, every stored item ends up on
//! exactly one side and both sides are non-empty.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use skiptree_core::{Component, Cpe, Dimension, SpacePart, Value};
use skiptree_store::DataStore;

fn store_of(values: &[i64]) -> DataStore {
    let mut store = DataStore::new();
    for &v in values {
        let mut part = SpacePart::new();
        part.set_component(Component::point(Dimension::new("x"), Value::int(v)));
        store.add(part, v.to_le_bytes().to_vec());
    }
    store
}

proptest! {
    #[test]
    fn split_partitions_every_item_exactly_once(
        seed in any::<u64>(),
        mut values in prop::collection::hash_set(-1000i64..1000, 2..32).prop_map(|s| s.into_iter().collect::<Vec<_>>())
    ) {
        values.sort_unstable();
        let store = store_of(&values);
        let mut rng = StdRng::seed_from_u64(seed);
        let split = store.get_partition_value(&Cpe::new(), &mut rng).unwrap();

        prop_assert!(!split.items_left.is_empty());
        prop_assert!(!split.items_right.is_empty());
        prop_assert_eq!(split.items_left.len() + split.items_right.len(), values.len());

        let mut seen: Vec<usize> = split.items_left.iter().chain(&split.items_right).copied().collect();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), values.len());
    }
}
