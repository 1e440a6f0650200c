//! SkipNet join (§4.7.1) — gets a joining peer onto the level-0 ring and
//! picks a skip-tree welcoming contact.

use skiptree_core::{Direction, NameID, NodeRef};
use skiptree_neighbourhood::Ring;
use skiptree_routing::{
    ApplicationPayload, ControlPayload, EncapsulatedMessage, Envelope, Payload, SnJoinReply,
    SnJoinRequest, SnJoinState, StJoinPhase, StJoinRequest,
};
use tracing::debug;

/// Build the envelope `J` sends to a known seed to start joining: a direct
/// hop to the seed carrying an encapsulated "route by name towards me"
/// request, so the seed only has to forward, never interpret, the inner
/// envelope.
#[must_use]
pub fn start_join(joining_node: NodeRef, seed: NodeRef) -> (NodeRef, Envelope) {
    debug!(seed = %seed.name_id, "starting join via seed");
    let inner = Envelope::RouteByName {
        name_id: joining_node.name_id.clone(),
        payload: Payload::Control(ControlPayload::SnJoinRequest(SnJoinRequest {
            state: SnJoinState::Seed,
            joining_node,
        })),
    };
    let envelope = Envelope::RouteDirect {
        dest: seed.clone(),
        payload: Payload::Application(ApplicationPayload::Encapsulated(EncapsulatedMessage {
            inner_envelope: Box::new(inner),
        })),
    };
    (seed, envelope)
}

/// At the seed, upon receiving the inner `SnJoinRequest`: drop it if the
/// seed happens to be the joiner itself, otherwise advance its state to
/// `Routing` and hand back the envelope for the dispatcher to forward
/// on (by-name routing towards `joining_node.name_id`).
#[must_use]
pub fn handle_at_seed(self_ref: &NodeRef, req: SnJoinRequest) -> Option<Envelope> {
    if req.joining_node.name_id == self_ref.name_id {
        debug!("dropping self join seen at seed");
        return None;
    }
    debug!(joiner = %req.joining_node.name_id, "forwarding join request towards joiner's name");
    Some(Envelope::RouteByName {
        name_id: req.joining_node.name_id.clone(),
        payload: Payload::Control(ControlPayload::SnJoinRequest(SnJoinRequest {
            state: SnJoinState::Routing,
            joining_node: req.joining_node,
        })),
    })
}

/// At `M`, the peer by-name routing terminates at: reply with the
/// level-0 ring's neighbours, directly to the joiner.
#[must_use]
pub fn handle_at_terminus(ring0: &Ring, joining_node: &NodeRef) -> (NodeRef, Envelope) {
    let reply = SnJoinReply {
        neighbours: ring0.unique_neighbours(),
    };
    debug!(joiner = %joining_node.name_id, neighbours = reply.neighbours.len(), "routing terminated, replying with ring0 neighbours");
    (
        joining_node.clone(),
        Envelope::RouteDirect {
            dest: joining_node.clone(),
            payload: Payload::Control(ControlPayload::SnJoinReply(reply)),
        },
    )
}

/// At `J`, after `repair_level(0, reply.neighbours)` has populated the
/// level-0 ring: pick the skip-tree welcoming contact. Prefer the side
/// that does not require wrapping; among non-wrapping sides, prefer the
/// larger shared name-id prefix.
#[must_use]
pub fn choose_st_contact(self_name_id: &NameID, ring0: &Ring) -> Option<NodeRef> {
    let left = ring0.side(Direction::Left);
    let right = ring0.side(Direction::Right);

    match (left.nearest(), right.nearest()) {
        (None, None) => None,
        (Some(l), None) => Some(l.clone()),
        (None, Some(r)) => Some(r.clone()),
        (Some(l), Some(r)) => {
            let l_wraps = left.can_wrap(self_name_id);
            let r_wraps = right.can_wrap(self_name_id);
            match (l_wraps, r_wraps) {
                (false, true) => Some(l.clone()),
                (true, false) => Some(r.clone()),
                _ => {
                    let l_prefix = self_name_id.longest_common_prefix_length(&l.name_id);
                    let r_prefix = self_name_id.longest_common_prefix_length(&r.name_id);
                    if l_prefix >= r_prefix {
                        Some(l.clone())
                    } else {
                        Some(r.clone())
                    }
                }
            }
        }
    }
}

/// Build the `STJoinRequest(ASK)` envelope `J` sends directly to its
/// chosen welcoming contact.
#[must_use]
pub fn build_st_ask(joining_node: NodeRef, contact: NodeRef) -> (NodeRef, Envelope) {
    debug!(contact = %contact.name_id, "asking skip-tree contact to welcome us");
    let envelope = Envelope::RouteDirect {
        dest: contact.clone(),
        payload: Payload::Control(ControlPayload::StJoinRequest(StJoinRequest {
            joining_node,
            phase: StJoinPhase::Ask,
        })),
    };
    (contact, envelope)
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
    fn seed_drops_self_join() {
        let seed = node("s");
        let req = SnJoinRequest {
            state: SnJoinState::Seed,
            joining_node: seed.clone(),
        };
        assert!(handle_at_seed(&seed, req).is_none());
    }

    #[test]
    fn seed_advances_state_and_forwards() {
        let seed = node("s");
        let joiner = node("j");
        let req = SnJoinRequest {
            state: SnJoinState::Seed,
            joining_node: joiner.clone(),
        };
        let forwarded = handle_at_seed(&seed, req).unwrap();
        match forwarded {
            Envelope::RouteByName { name_id, payload } => {
                assert_eq!(name_id, joiner.name_id);
                match payload {
                    Payload::Control(ControlPayload::SnJoinRequest(r)) => {
                        assert_eq!(r.state, SnJoinState::Routing);
                    }
                    _ => panic!("expected SnJoinRequest"),
                }
            }
            _ => panic!("expected RouteByName"),
        }
    }

    #[test]
    fn terminus_replies_with_ring0_neighbours() {
        let joiner = node("j");
        let mut ring0 = Ring::new(8);
        ring0.add_neighbour(node("a"), &node("m").name_id);
        let (to, envelope) = handle_at_terminus(&ring0, &joiner);
        assert_eq!(to.name_id, joiner.name_id);
        match envelope {
            Envelope::RouteDirect {
                payload: Payload::Control(ControlPayload::SnJoinReply(reply)),
                ..
            } => assert_eq!(reply.neighbours.len(), 1),
            _ => panic!("expected RouteDirect(SnJoinReply)"),
        }
    }

    #[test]
    fn choose_st_contact_prefers_non_wrapping_side() {
        let me = node("m");
        let mut ring0 = Ring::new(8);
        ring0.add_neighbour(node("a"), &me.name_id); // left
        ring0.add_neighbour(node("z"), &me.name_id); // right
        let contact = choose_st_contact(&me.name_id, &ring0).unwrap();
        assert!(contact.name_id == NameID::new("a") || contact.name_id == NameID::new("z"));
    }
}
