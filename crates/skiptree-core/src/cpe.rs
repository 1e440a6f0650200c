//! `InternalNode` and `CPE` — the path of split decisions from the
//! skip-tree root to a peer's leaf.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::component::ComponentValue;
use crate::dimension::Dimension;
use crate::error::CoreError;
use crate::identifiers::Direction;
use crate::range::Range;
use crate::space_part::SpacePart;
use crate::value::Value;

/// One split decision: `direction == Left` means "the leaf beneath this
/// node is on the side where `value <= pivot`".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalNode {
    pub direction: Direction,
    pub dimension: Dimension,
    pub value: Value,
}

impl InternalNode {
    #[must_use]
    pub fn new(direction: Direction, dimension: Dimension, value: Value) -> Self {
        Self {
            direction,
            dimension,
            value,
        }
    }

    /// Whether `range` intersects the half-space this node represents.
    ///
    /// This overlap test is evaluated at the pivot itself (`<=`/`>=`)
    /// regardless of the range's own inclusion flags — a pragmatic
    /// approximation consistent with how the reference implementation
    /// treats split boundaries as belonging to exactly one side at
    /// classification time, with exact membership settled by
    /// `SpacePart::includes_value` once routing reaches a single leaf.
    #[must_use]
    pub fn is_here(&self, range: &Range<Value>) -> bool {
        match self.direction {
            Direction::Left => range.min.as_ref().is_none_or(|lo| lo <= &self.value),
            Direction::Right => range.max.as_ref().is_none_or(|hi| hi >= &self.value),
        }
    }
}

/// The classification of a `SpacePart` against a peer's leaf.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SideClassification {
    pub left: bool,
    pub here: bool,
    pub right: bool,
}

/// The ordered path of split decisions from the skip-tree root to this
/// peer's leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpe {
    nodes: Vec<InternalNode>,
}

impl Cpe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn nodes(&self) -> &[InternalNode] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a split decision. Order matters: root-first.
    pub fn add_node(&mut self, direction: Direction, dimension: Dimension, value: Value) {
        self.nodes.push(InternalNode::new(direction, dimension, value));
    }

    /// `self` extended with one more split, without mutating `self` — used
    /// when computing the joiner's and welcomer's post-join CPEs from a
    /// shared parent (§4.7.2).
    #[must_use]
    pub fn extended(&self, direction: Direction, dimension: Dimension, value: Value) -> Self {
        let mut out = self.clone();
        out.add_node(direction, dimension, value);
        out
    }

    /// Distinct dimensions observed along this path, with counts (internal
    /// nodes may repeat a dimension after further splits in the original
    /// system, so counts can exceed one).
    #[must_use]
    pub fn dimension_counts(&self) -> HashMap<Dimension, usize> {
        let mut counts = HashMap::new();
        for n in &self.nodes {
            *counts.entry(n.dimension.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of distinct dimensions split along this path.
    #[must_use]
    pub fn k(&self) -> usize {
        self.dimension_counts().len()
    }

    /// Classify `part` against this leaf.
    ///
    /// `forking = false` requires every dimension split along this path to
    /// be present in `part`, failing with [`CoreError::MissingDimension`]
    /// otherwise (used for point inserts, which always carry every
    /// dimension they need). `forking = true` treats a missing dimension as
    /// "could be on either side" (§4.2) — used by range queries, which may
    /// omit dimensions entirely.
    ///
    /// # Errors
    /// Returns [`CoreError::MissingDimension`] only when `forking` is
    /// `false` and `part` lacks a dimension this CPE splits on.
    pub fn which_side_space(
        &self,
        part: &SpacePart,
        forking: bool,
    ) -> Result<SideClassification, CoreError> {
        let mut nb_here = 0usize;
        let mut out = SideClassification::default();

        for n in &self.nodes {
            let Some(component) = part.component(&n.dimension) else {
                if !forking {
                    return Err(CoreError::MissingDimension(n.dimension.clone()));
                }
                nb_here += 1;
                match n.direction.opposite() {
                    Direction::Left => out.left = true,
                    Direction::Right => out.right = true,
                }
                continue;
            };

            let r = component.value.as_range();
            if n.is_here(&r) {
                nb_here += 1;
                out.left |= r.any_point_before(&n.value);
                out.right |= r.any_point_after(&n.value);
            } else {
                match n.direction.opposite() {
                    Direction::Left => out.left = true,
                    Direction::Right => out.right = true,
                }
                // A whole-space rejection at this node means no further
                // node on the path can contradict it.
                break;
            }
        }

        out.here = nb_here == self.nodes.len();
        debug_assert!(
            out.left || out.here || out.right,
            "which_side_space must classify to at least one side"
        );
        Ok(out)
    }

    /// For `dimension`, scan this CPE from leaf back to root and return
    /// `(min, max)`: `min` is the value of the most recent `Right` node on
    /// that dimension, `max` of the most recent `Left` node. Unset
    /// endpoints are unbounded.
    #[must_use]
    pub fn get_range(&self, dimension: &Dimension) -> Range<Value> {
        let mut min = None;
        let mut max = None;
        for n in self.nodes.iter().rev() {
            if &n.dimension != dimension {
                continue;
            }
            match n.direction {
                Direction::Right if min.is_none() => min = Some(n.value.clone()),
                Direction::Left if max.is_none() => max = Some(n.value.clone()),
                _ => {}
            }
            if min.is_some() && max.is_some() {
                break;
            }
        }
        Range {
            min,
            max,
            min_included: true,
            max_included: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    fn dim(name: &str) -> Dimension {
        Dimension::new(name)
    }

    fn point_part(d: &str, v: i64) -> SpacePart {
        let mut p = SpacePart::new();
        p.set_component(Component::point(dim(d), Value::int(v)));
        p
    }

    #[test]
    fn single_split_classifies_both_sides() {
        let mut cpe = Cpe::new();
        cpe.add_node(Direction::Left, dim("x"), Value::int(5));

        let left = cpe.which_side_space(&point_part("x", 3), false).unwrap();
        assert!(left.here);
        assert!(!left.right);

        let right_part = point_part("x", 7);
        let right = cpe.which_side_space(&right_part, false).unwrap();
        assert!(!right.here);
        assert!(right.right);
    }

    #[test]
    fn missing_dimension_fails_non_forking() {
        let mut cpe = Cpe::new();
        cpe.add_node(Direction::Left, dim("x"), Value::int(5));
        let part = point_part("y", 1);
        assert_eq!(
            cpe.which_side_space(&part, false).unwrap_err(),
            CoreError::MissingDimension(dim("x"))
        );
    }

    #[test]
    fn missing_dimension_forks_both_ways() {
        let mut cpe = Cpe::new();
        cpe.add_node(Direction::Left, dim("x"), Value::int(5));
        cpe.add_node(Direction::Right, dim("y"), Value::int(2));

        let part = point_part("x", 0); // lacks y
        let side = cpe.which_side_space(&part, true).unwrap();
        // x classifies here; y is missing and forks: opposite of Right is Left.
        assert!(side.left);
    }

    #[test]
    fn get_range_scans_leaf_to_root() {
        let mut cpe = Cpe::new();
        cpe.add_node(Direction::Right, dim("x"), Value::int(2));
        cpe.add_node(Direction::Left, dim("x"), Value::int(8));
        let r = cpe.get_range(&dim("x"));
        assert_eq!(r.min, Some(Value::int(2)));
        assert_eq!(r.max, Some(Value::int(8)));
    }

    #[test]
    fn k_counts_distinct_dimensions() {
        let mut cpe = Cpe::new();
        cpe.add_node(Direction::Left, dim("x"), Value::int(1));
        cpe.add_node(Direction::Right, dim("x"), Value::int(2));
        cpe.add_node(Direction::Left, dim("y"), Value::int(3));
        assert_eq!(cpe.k(), 2);
    }
}
