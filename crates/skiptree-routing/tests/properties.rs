//! Property test over `PidRange` narrowing: restricting a window must
//! never let it re-admit a partition-id it already excluded.

use proptest::prelude::*;
use skiptree_core::Direction;
use skiptree_routing::{includes_pid, PidRange};
use skiptree_core::PartitionID;

proptest! {
    #[test]
    fn narrowing_only_shrinks_the_admitted_set(bound in 0.01f64..0.99, probe in 0.0f64..1.0) {
        let bound = PartitionID::from_raw(bound);
        let probe = if probe <= 0.0 || probe >= 1.0 { 0.5 } else { probe };
        let probe = PartitionID::from_raw(probe);

        let full = PidRange::unbounded();
        let right_narrowed = full.restrict(Direction::Right, bound);
        let left_narrowed = full.restrict(Direction::Left, bound);

        // Anything the narrowed range admits, the unbounded range must too.
        if includes_pid(&right_narrowed, probe) {
            prop_assert!(includes_pid(&full, probe));
            prop_assert!(probe.value() >= bound.value());
        }
        if includes_pid(&left_narrowed, probe) {
            prop_assert!(includes_pid(&full, probe));
            prop_assert!(probe.value() <= bound.value());
        }
    }
}
