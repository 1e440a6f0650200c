//! `Neighbourhood` — the full set of ring levels a peer maintains, indexed
//! by shared numeric-id prefix length (§4.5).

use skiptree_core::{NameID, NodeRef, NUMERIC_ID_BITS};

use skiptree_core::Direction;
use tracing::debug;

use crate::ring::Ring;

/// Every ring level from `0` (the SkipNet ring proper, all peers are
/// candidates) up to `NUMERIC_ID_BITS` (only a bit-identical peer, which
/// in practice never happens once the id space is large enough).
#[derive(Debug, Clone)]
pub struct Neighbourhood {
    self_name_id: NameID,
    bound: usize,
    rings: Vec<Ring>,
}

impl Neighbourhood {
    #[must_use]
    pub fn new(self_name_id: NameID, bound: usize) -> Self {
        let levels = NUMERIC_ID_BITS as usize + 1;
        Self {
            self_name_id,
            bound,
            rings: (0..levels).map(|_| Ring::new(bound)).collect(),
        }
    }

    #[must_use]
    pub fn bound(&self) -> usize {
        self.bound
    }

    #[must_use]
    pub fn levels(&self) -> usize {
        self.rings.len()
    }

    #[must_use]
    pub fn ring(&self, level: usize) -> &Ring {
        &self.rings[level]
    }

    #[must_use]
    pub fn ring_mut(&mut self, level: usize) -> &mut Ring {
        &mut self.rings[level]
    }

    /// Insert `node` at `level`, into whichever side its `NameID` puts it
    /// on. Returns `true` iff this was a new entry (not a refresh, not
    /// self).
    pub fn add_neighbour(&mut self, level: usize, node: NodeRef) -> bool {
        self.rings[level].add_neighbour(node, &self.self_name_id)
    }

    /// Remove a peer from every ring level it might appear on. Returns
    /// `true` iff it was present anywhere.
    pub fn remove_neighbour(&mut self, name_id: &NameID) -> bool {
        let mut removed = false;
        for ring in &mut self.rings {
            if ring.remove_neighbour(name_id).is_some() {
                removed = true;
            }
        }
        if removed {
            debug!(name_id = %name_id, "removed peer from every ring level it appeared on");
        }
        removed
    }

    /// The closest known neighbour at `level` on `direction`, or `self_ref`
    /// if that half-ring is empty (routing then terminates at self, the
    /// furthest this peer's knowledge can reach).
    #[must_use]
    pub fn get_neighbour(&self, direction: Direction, level: usize, self_ref: &NodeRef) -> NodeRef {
        self.rings[level]
            .side(direction)
            .nearest()
            .cloned()
            .unwrap_or_else(|| self_ref.clone())
    }

    /// Highest ring level at which this peer holds any neighbour, or `0` if
    /// every level is empty.
    #[must_use]
    pub fn highest_populated_level(&self) -> usize {
        self.rings
            .iter()
            .enumerate()
            .rev()
            .find(|(_, r)| !r.is_empty())
            .map_or(0, |(i, _)| i)
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
    fn get_neighbour_falls_back_to_self_when_empty() {
        let nb = Neighbourhood::new(NameID::new("m"), 8);
        let me = node("m");
        let got = nb.get_neighbour(Direction::Right, 0, &me);
        assert_eq!(got.name_id, me.name_id);
    }

    #[test]
    fn remove_neighbour_clears_every_level() {
        let mut nb = Neighbourhood::new(NameID::new("m"), 8);
        nb.add_neighbour(0, node("z"));
        nb.add_neighbour(3, node("z"));
        assert!(nb.remove_neighbour(&NameID::new("z")));
        assert!(nb.ring(0).is_empty());
        assert!(nb.ring(3).is_empty());
        assert!(!nb.remove_neighbour(&NameID::new("z")));
    }

    #[test]
    fn highest_populated_level_tracks_insertions() {
        let mut nb = Neighbourhood::new(NameID::new("m"), 8);
        assert_eq!(nb.highest_populated_level(), 0);
        nb.add_neighbour(5, node("z"));
        assert_eq!(nb.highest_populated_level(), 5);
    }
}
