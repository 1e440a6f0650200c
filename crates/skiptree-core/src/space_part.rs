//! `SpacePart` — a map from `Dimension` to `Component`, used both as a
//! stored key and as a query/range.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentValue};
use crate::dimension::Dimension;
use crate::range::Range;
use crate::value::Value;

/// A mapping from [`Dimension`] to [`Component`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacePart {
    components: BTreeMap<Dimension, Component>,
}

impl SpacePart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single_point(dimension: Dimension, value: Value) -> Self {
        let mut part = Self::new();
        part.set_component(Component::point(dimension, value));
        part
    }

    pub fn set_component(&mut self, component: Component) {
        self.components.insert(component.dimension.clone(), component);
    }

    #[must_use]
    pub fn component(&self, dimension: &Dimension) -> Option<&Component> {
        self.components.get(dimension)
    }

    #[must_use]
    pub fn dimensions(&self) -> impl Iterator<Item = &Dimension> {
        self.components.keys()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Remove a dimension from this part entirely.
    #[must_use]
    pub fn generalize(&self, dimension: &Dimension) -> Self {
        let mut out = self.clone();
        out.components.remove(dimension);
        out
    }

    /// True if any component is a non-degenerate range rather than a point.
    #[must_use]
    pub fn is_range(&self) -> bool {
        self.components.values().any(Component::is_range)
    }

    /// Widen every point component to a degenerate closed range, so this
    /// part can be compared uniformly against a query that uses ranges.
    #[must_use]
    pub fn val2range(&self) -> Self {
        let mut out = self.clone();
        for c in out.components.values_mut() {
            if let ComponentValue::Point(v) = &c.value {
                c.value = ComponentValue::Range(Range::point(v.clone()));
            }
        }
        out
    }

    /// Whether `self` (treated as a query/range) includes the point
    /// `SpacePart` `point`. Every dimension present in `self` must be
    /// present in `point` and satisfied; dimensions in `point` but absent
    /// from `self` are unconstrained and always pass.
    #[must_use]
    pub fn includes_value(&self, point: &Self) -> bool {
        for (dim, query_component) in &self.components {
            let Some(candidate) = point.component(dim) else {
                return false;
            };
            let candidate_value = match &candidate.value {
                ComponentValue::Point(v) => v,
                ComponentValue::Range(r) if r.is_degenerate() => {
                    let Some(v) = r.min.as_ref() else {
                        return false;
                    };
                    v
                }
                ComponentValue::Range(_) => return false,
            };
            let query_range = query_component.value.as_range();
            if !query_range.includes_value(candidate_value) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dim(name: &str) -> Dimension {
        Dimension::new(name)
    }

    #[test]
    fn includes_value_checks_every_query_dimension() {
        let mut query = SpacePart::new();
        query.set_component(Component::range(
            dim("x"),
            Range::closed(Value::int(0), Value::int(10)),
        ));
        query.set_component(Component::range(
            dim("y"),
            Range::closed(Value::int(0), Value::int(10)),
        ));

        let point = SpacePart::single_point(dim("x"), Value::int(5));
        // y missing from the point -> fails the query's y constraint.
        assert!(!query.includes_value(&point));

        let mut full_point = SpacePart::new();
        full_point.set_component(Component::point(dim("x"), Value::int(5)));
        full_point.set_component(Component::point(dim("y"), Value::int(9)));
        assert!(query.includes_value(&full_point));
    }

    #[test]
    fn generalize_removes_dimension() {
        let mut part = SpacePart::new();
        part.set_component(Component::point(dim("x"), Value::int(1)));
        part.set_component(Component::point(dim("y"), Value::int(2)));
        let g = part.generalize(&dim("x"));
        assert!(g.component(&dim("x")).is_none());
        assert!(g.component(&dim("y")).is_some());
    }

    #[test]
    fn val2range_widens_points() {
        let part = SpacePart::single_point(dim("x"), Value::int(5));
        let widened = part.val2range();
        assert!(!widened.is_range()); // degenerate ranges don't count as "range"
        match &widened.component(&dim("x")).unwrap().value {
            ComponentValue::Range(r) => assert!(r.is_degenerate()),
            ComponentValue::Point(_) => panic!("expected range"),
        }
    }
}
