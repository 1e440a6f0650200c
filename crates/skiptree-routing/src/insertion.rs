//! Point-insert preparation (§4.6): a non-forking `RouteByCpe` call
//! requires every dimension a `Cpe` has ever split on to be present in the
//! `SpacePart` being routed, or `which_side_space` fails with
//! [`CoreError::MissingDimension`]. Real insert keys only carry the
//! dimensions the inserting client happened to set, so the dispatcher
//! synthesises the missing ones as virtual full-range components before
//! routing.

use skiptree_core::{Component, Cpe, Dimension, SpacePart};

/// Extend `part` with a virtual, unconstrained component for every
/// dimension `cpe` splits on that `part` doesn't already carry.
///
/// Existing components in `part` are left untouched; only dimensions
/// absent from `part` gain a synthetic entry, built from `cpe`'s own
/// `get_range` so the virtual component narrows as tightly as the path
/// already implies rather than defaulting to a fully unbounded range.
#[must_use]
pub fn synthesize_missing_dimensions(cpe: &Cpe, part: &SpacePart) -> SpacePart {
    let mut out = part.clone();
    for dimension in cpe.dimension_counts().into_keys() {
        if out.component(&dimension).is_some() {
            continue;
        }
        out.set_component(Component::virtual_range(
            dimension.clone(),
            cpe.get_range(&dimension),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiptree_core::{Direction, Value};

    fn dim(name: &str) -> Dimension {
        Dimension::new(name)
    }

    #[test]
    fn leaves_present_dimensions_untouched() {
        let mut cpe = Cpe::new();
        cpe.add_node(Direction::Left, dim("x"), Value::int(5));

        let part = SpacePart::single_point(dim("x"), Value::int(1));
        let out = synthesize_missing_dimensions(&cpe, &part);

        assert_eq!(out.len(), 1);
        assert!(!out.component(&dim("x")).unwrap().is_virtual);
    }

    #[test]
    fn fills_missing_dimension_with_virtual_range() {
        let mut cpe = Cpe::new();
        cpe.add_node(Direction::Left, dim("x"), Value::int(5));
        cpe.add_node(Direction::Right, dim("y"), Value::int(2));

        let part = SpacePart::single_point(dim("x"), Value::int(1));
        let out = synthesize_missing_dimensions(&cpe, &part);

        assert_eq!(out.len(), 2);
        let y = out.component(&dim("y")).unwrap();
        assert!(y.is_virtual);
        assert_eq!(y.value.as_range().min, Some(Value::int(2)));
    }

    #[test]
    fn no_op_when_cpe_is_empty() {
        let part = SpacePart::single_point(dim("x"), Value::int(1));
        let out = synthesize_missing_dimensions(&Cpe::new(), &part);
        assert_eq!(out, part);
    }
}
