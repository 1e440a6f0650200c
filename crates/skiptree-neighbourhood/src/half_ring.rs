//! `HalfRing` — a bounded, sorted list of neighbours on one side (LEFT or
//! RIGHT) of one ring level.

use skiptree_core::{lies_between_direction, Direction, NameID, NodeRef};
use tracing::debug;

/// One side of a ring level: neighbours ordered by `NameID`, nearest first,
/// bounded to at most `bound` entries.
#[derive(Debug, Clone)]
pub struct HalfRing {
    direction: Direction,
    bound: usize,
    entries: Vec<NodeRef>,
}

impl HalfRing {
    #[must_use]
    pub fn new(direction: Direction, bound: usize) -> Self {
        Self {
            direction,
            bound,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.bound > 0 && self.entries.len() >= self.bound
    }

    #[must_use]
    pub fn entries(&self) -> &[NodeRef] {
        &self.entries
    }

    /// Nearest neighbour on this side, if any.
    #[must_use]
    pub fn nearest(&self) -> Option<&NodeRef> {
        self.entries.first()
    }

    /// Farthest neighbour on this side, if any.
    #[must_use]
    pub fn farthest(&self) -> Option<&NodeRef> {
        self.entries.last()
    }

    /// `true` once this half-ring's nearest entry is on the *other* side of
    /// `self_name_id` than `direction` points, meaning the half-ring already
    /// wraps all the way around the name-id ring.
    #[must_use]
    pub fn can_wrap(&self, self_name_id: &NameID) -> bool {
        match self.entries.first() {
            None => false,
            Some(first) => match self.direction {
                Direction::Right => &first.name_id < self_name_id,
                Direction::Left => &first.name_id > self_name_id,
            },
        }
    }

    /// Insert or refresh `node`.
    ///
    /// - A node matching `self_name_id` is rejected outright.
    /// - A node already present (same `NameID`) has its `Cpe` refreshed in
    ///   place; this does not count as a new insertion.
    /// - Otherwise the node is inserted at the position that keeps entries
    ///   sorted nearest-to-farthest from `self_name_id` in `direction`,
    ///   evicting the farthest entry if the bound is exceeded.
    ///
    /// Returns `true` iff `node` was newly inserted.
    pub fn add_neighbour(&mut self, node: NodeRef, self_name_id: &NameID) -> bool {
        if node.name_id == *self_name_id {
            return false;
        }

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.name_id == node.name_id)
        {
            existing.cpe = node.cpe;
            return false;
        }

        let wrap = self.can_wrap(self_name_id);
        let mut insert_at = self.entries.len();
        for (i, current) in self.entries.iter().enumerate() {
            let prev = if i == 0 {
                self_name_id
            } else {
                &self.entries[i - 1].name_id
            };
            if lies_between_direction(self.direction, prev, &node.name_id, &current.name_id, wrap)
            {
                insert_at = i;
                break;
            }
        }

        let inserted_name = node.name_id.clone();
        self.entries.insert(insert_at, node);
        debug!(direction = ?self.direction, name_id = %inserted_name, "new neighbour");
        if self.bound > 0 && self.entries.len() > self.bound {
            let evicted = self.entries.pop();
            if let Some(evicted) = evicted {
                debug!(direction = ?self.direction, name_id = %evicted.name_id, "evicted farthest neighbour, bound exceeded");
            }
        }
        true
    }

    /// Remove the entry with this `NameID`, if present. Returns it.
    pub fn remove(&mut self, name_id: &NameID) -> Option<NodeRef> {
        let idx = self.entries.iter().position(|e| &e.name_id == name_id)?;
        let removed = self.entries.remove(idx);
        debug!(direction = ?self.direction, name_id = %removed.name_id, "removed neighbour");
        Some(removed)
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
    fn inserts_sorted_ascending_to_the_right() {
        let mut hr = HalfRing::new(Direction::Right, 8);
        let self_name = NameID::new("m");
        hr.add_neighbour(node("p"), &self_name);
        hr.add_neighbour(node("n"), &self_name);
        hr.add_neighbour(node("z"), &self_name);
        let names: Vec<_> = hr.entries().iter().map(|e| e.name_id.as_str()).collect();
        assert_eq!(names, vec!["n", "p", "z"]);
    }

    #[test]
    fn rejects_self() {
        let mut hr = HalfRing::new(Direction::Right, 8);
        let self_name = NameID::new("m");
        assert!(!hr.add_neighbour(node("m"), &self_name));
        assert!(hr.is_empty());
    }

    #[test]
    fn updates_existing_in_place_without_growth() {
        let mut hr = HalfRing::new(Direction::Right, 8);
        let self_name = NameID::new("m");
        hr.add_neighbour(node("n"), &self_name);
        assert_eq!(hr.len(), 1);
        assert!(!hr.add_neighbour(node("n"), &self_name));
        assert_eq!(hr.len(), 1);
    }

    #[test]
    fn evicts_farthest_when_bound_exceeded() {
        let mut hr = HalfRing::new(Direction::Right, 2);
        let self_name = NameID::new("a");
        hr.add_neighbour(node("b"), &self_name);
        hr.add_neighbour(node("c"), &self_name);
        hr.add_neighbour(node("d"), &self_name);
        assert_eq!(hr.len(), 2);
        let names: Vec<_> = hr.entries().iter().map(|e| e.name_id.as_str()).collect();
        assert_eq!(names, vec!["b", "c"]);
    }
}
