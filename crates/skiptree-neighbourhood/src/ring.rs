//! `Ring` — one skip-ring level: a LEFT and a RIGHT `HalfRing`.

use skiptree_core::{Direction, NameID, NodeRef};

use crate::half_ring::HalfRing;

/// Which half-ring a node belongs to, from `self_name_id`'s point of view.
///
/// Mirrors by-name routing's own direction rule (§4.6): a neighbour whose
/// `NameID` sorts below `self` lies in the LEFT half-ring, at or above in
/// the RIGHT.
#[must_use]
pub fn by_name_get_direction(self_name_id: &NameID, other_name_id: &NameID) -> Direction {
    if self_name_id > other_name_id {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// One ring level: a LEFT half-ring and a RIGHT half-ring, each bounded
/// independently.
#[derive(Debug, Clone)]
pub struct Ring {
    left: HalfRing,
    right: HalfRing,
}

impl Ring {
    #[must_use]
    pub fn new(bound: usize) -> Self {
        Self {
            left: HalfRing::new(Direction::Left, bound),
            right: HalfRing::new(Direction::Right, bound),
        }
    }

    #[must_use]
    pub fn side(&self, direction: Direction) -> &HalfRing {
        match direction {
            Direction::Left => &self.left,
            Direction::Right => &self.right,
        }
    }

    #[must_use]
    pub fn side_mut(&mut self, direction: Direction) -> &mut HalfRing {
        match direction {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }

    /// Insert `node` into whichever half-ring its `NameID` belongs on,
    /// relative to `self_name_id`.
    pub fn add_neighbour(&mut self, node: NodeRef, self_name_id: &NameID) -> bool {
        let direction = by_name_get_direction(self_name_id, &node.name_id);
        self.side_mut(direction).add_neighbour(node, self_name_id)
    }

    /// Remove `name_id` from whichever side it is on. Returns the removed
    /// entry, if any.
    pub fn remove_neighbour(&mut self, name_id: &NameID) -> Option<NodeRef> {
        self.left
            .remove(name_id)
            .or_else(|| self.right.remove(name_id))
    }

    /// All distinct neighbours known at this level, left and right combined,
    /// deduplicated by `NameID`. Used to seed a joiner's own ring-0 table
    /// (§4.7.1).
    #[must_use]
    pub fn unique_neighbours(&self) -> Vec<NodeRef> {
        let mut out: Vec<NodeRef> = self.left.entries().to_vec();
        for n in self.right.entries() {
            if !out.iter().any(|e| e.name_id == n.name_id) {
                out.push(n.clone());
            }
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiptree_core::{Cpe, NumericID, PartitionID};
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    fn node(name: &str) -> NodeRef {
        NodeRef::new(
            NameID::new(name),
            NumericID::from_seed(name.as_bytes()),
            PartitionID::from_raw(0.5),
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000)),
            Cpe::new(),
        )
    }

    #[test]
    fn routes_by_name_to_correct_side() {
        let self_name = NameID::new("m");
        let mut ring = Ring::new(8);
        ring.add_neighbour(node("a"), &self_name);
        ring.add_neighbour(node("z"), &self_name);
        assert_eq!(ring.side(Direction::Left).len(), 1);
        assert_eq!(ring.side(Direction::Right).len(), 1);
    }

    #[test]
    fn unique_neighbours_dedups_across_sides() {
        let self_name = NameID::new("m");
        let mut ring = Ring::new(8);
        ring.add_neighbour(node("a"), &self_name);
        ring.add_neighbour(node("z"), &self_name);
        let all = ring.unique_neighbours();
        assert_eq!(all.len(), 2);
    }
}
