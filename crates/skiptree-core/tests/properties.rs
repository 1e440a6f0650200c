//! Property tests over the identifier orderings that every other crate
//! builds its routing invariants on.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use skiptree_core::{lies_between_direction, Direction, PartitionID};

proptest! {
    /// `gen_btw` must never return a bound itself, for any open interval
    /// wide enough to contain a representable float.
    #[test]
    fn gen_btw_is_strictly_inside_its_bounds(seed in any::<u64>(), lo in 0.0001f64..0.49, width in 0.0001f64..0.49) {
        let mut rng = StdRng::seed_from_u64(seed);
        let l = PartitionID::from_raw(lo);
        let u = PartitionID::from_raw(lo + width);
        let x = PartitionID::gen_btw(&mut rng, l, u).unwrap();
        prop_assert!(x.value() > l.value());
        prop_assert!(x.value() < u.value());
    }

    /// Scanning RIGHT without wrap: `b` qualifies iff it is strictly
    /// between `a` and `c`, matching a plain integer comparison.
    #[test]
    fn lies_between_right_no_wrap_matches_plain_comparison(a in 0i64..1000, gap1 in 1i64..1000, gap2 in 1i64..1000) {
        let b = a + gap1;
        let c = b + gap2;
        prop_assert!(lies_between_direction(Direction::Right, &a, &b, &c, false));
        prop_assert!(!lies_between_direction(Direction::Right, &a, &c, &b, false));
    }

    /// Scanning RIGHT with wrap enabled but no actual wrap needed (`a < c`)
    /// must behave exactly as the non-wrapping case.
    #[test]
    fn wrap_flag_is_irrelevant_when_no_wrap_is_needed(a in 0i64..1000, gap1 in 1i64..1000, gap2 in 1i64..1000) {
        let b = a + gap1;
        let c = b + gap2;
        prop_assert_eq!(
            lies_between_direction(Direction::Right, &a, &b, &c, false),
            lies_between_direction(Direction::Right, &a, &b, &c, true)
        );
    }
}
