//! By-name routing: greedy-shortest-prefix walk of the SkipNet rings
//! towards a target `NameID` (§4.6).

use skiptree_core::{lies_between_direction, NameID, NodeRef};
use skiptree_neighbourhood::Neighbourhood;

use crate::envelope::Envelope;

/// Compute the next hop towards `dest_name_id`, scanning from the highest
/// ring level down to `0`. Returns `self_ref` itself once no ring yields a
/// closer candidate (the envelope has arrived).
#[must_use]
pub fn next_hop_by_name(
    self_ref: &NodeRef,
    neighbourhood: &Neighbourhood,
    dest_name_id: &NameID,
) -> NodeRef {
    let direction = Envelope::direction_towards(&self_ref.name_id, dest_name_id);

    for level in (0..neighbourhood.levels()).rev() {
        let side = neighbourhood.ring(level).side(direction);
        let Some(nh) = side.nearest() else {
            continue;
        };
        if nh.name_id == self_ref.name_id {
            continue;
        }
        let can_wrap = side.can_wrap(&self_ref.name_id);
        if lies_between_direction(
            direction,
            &self_ref.name_id,
            &nh.name_id,
            dest_name_id,
            can_wrap,
        ) {
            return nh.clone();
        }
    }

    self_ref.clone()
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
    fn routes_towards_closer_neighbour_in_between() {
        let me = node("m");
        let mut nb = Neighbourhood::new(me.name_id.clone(), 8);
        nb.add_neighbour(0, node("p")); // between m and z
        nb.add_neighbour(0, node("z"));

        let next = next_hop_by_name(&me, &nb, &NameID::new("z"));
        assert_eq!(next.name_id, NameID::new("p"));
    }

    #[test]
    fn arrives_at_self_when_no_closer_candidate() {
        let me = node("m");
        let nb = Neighbourhood::new(me.name_id.clone(), 8);
        let next = next_hop_by_name(&me, &nb, &NameID::new("z"));
        assert_eq!(next.name_id, me.name_id);
    }
}
