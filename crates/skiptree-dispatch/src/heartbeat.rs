//! Heartbeat sweep (§4.8): periodic ring pings plus one upward fix-up pass,
//! run by a dedicated thread at `NodeConfig::heartbeat_period` (default 10
//! min).

use skiptree_core::NodeRef;
use skiptree_join::{fix_from_level, ping_full_ring};
use skiptree_neighbourhood::Neighbourhood;
use skiptree_routing::Envelope;

/// Ping every populated ring level, then kick one `fix_from_level(0)` pass
/// to discover any neighbour one ring higher than currently known.
#[must_use]
pub fn sweep(self_ref: &NodeRef, neighbourhood: &Neighbourhood) -> Vec<(NodeRef, Envelope)> {
    let mut out = Vec::new();
    for level in 0..=neighbourhood.highest_populated_level() {
        out.extend(ping_full_ring(self_ref, neighbourhood, level));
    }
    out.extend(fix_from_level(self_ref, neighbourhood, 0));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiptree_core::{Cpe, NameID, NumericID, PartitionID};
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
    fn sweep_is_empty_for_a_fresh_peer() {
        let me = node("m");
        let nb = Neighbourhood::new(me.name_id.clone(), 8);
        assert!(sweep(&me, &nb).is_empty());
    }

    #[test]
    fn sweep_pings_every_populated_level() {
        let me = node("m");
        let mut nb = Neighbourhood::new(me.name_id.clone(), 8);
        nb.add_neighbour(0, node("a"));
        nb.add_neighbour(2, node("b"));
        let envelopes = sweep(&me, &nb);
        assert!(envelopes.len() >= 2);
    }
}
