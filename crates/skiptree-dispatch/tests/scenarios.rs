//! End-to-end peer scenarios driven purely through `Dispatcher`'s public
//! API, the way the CLI and net layers drive it in production.

use rand::rngs::StdRng;
use rand::SeedableRng;
use skiptree_core::{Component, Cpe, Dimension, NameID, NodeConfig, NodeRef, NumericID, PartitionID, SpacePart, Value};
use skiptree_dispatch::{AppEvent, Dispatcher, LocalNode};
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

fn dispatcher(name: &str, seed: u64) -> Dispatcher<StdRng> {
    Dispatcher::new(LocalNode::new(node(name), NodeConfig::default()), StdRng::seed_from_u64(seed))
}

fn point(dim: &str, v: i64) -> SpacePart {
    let mut p = SpacePart::new();
    p.set_component(Component::point(Dimension::new(dim), Value::int(v)));
    p
}

/// Scenario: a single peer with no neighbours at all. Insert and lookup
/// must both resolve entirely without producing any outbound sends.
#[test]
fn lone_peer_insert_then_lookup_round_trips_locally() {
    let mut d = dispatcher("m", 1);
    assert!(d.insert_routed(point("x", 5), b"hello".to_vec()).is_empty());

    let outbound = d.lookup(point("x", 5), 7);
    assert!(outbound.is_empty());

    let events = d.take_events();
    match events.as_slice() {
        [AppEvent::LookupReply(reply)] => {
            assert_eq!(reply.nonce, 7);
            assert_eq!(reply.data, vec![(point("x", 5), b"hello".to_vec())]);
        }
        other => panic!("expected exactly one LookupReply, got {other:?}"),
    }
}

/// Scenario: a peer fails mid-session. `node_fail` must drop it from
/// every ring level it was on and surface `PeerFailed`; a subsequent
/// heartbeat sweep must not try to reach it again.
#[test]
fn failed_peer_is_dropped_and_heartbeat_stops_contacting_it() {
    let mut d = dispatcher("m", 2);
    let z = node("z");
    d.node.neighbourhood.add_neighbour(0, z.clone());
    assert!(!d.node.neighbourhood.ring(0).is_empty());

    d.node_fail(&z);
    assert!(d.node.neighbourhood.ring(0).is_empty());
    assert!(matches!(d.take_events().as_slice(), [AppEvent::PeerFailed(p)] if p.name_id == z.name_id));

    let outbound = d.heartbeat_tick();
    assert!(
        outbound.iter().all(|(to, _)| to.name_id != z.name_id),
        "heartbeat must not address a peer already dropped for failure"
    );
}

/// Scenario: re-failing a peer that was never a neighbour (e.g. a
/// duplicate failure notification) is a no-op, not a spurious event.
#[test]
fn failing_an_unknown_peer_is_a_quiet_no_op() {
    let mut d = dispatcher("m", 3);
    d.node_fail(&node("ghost"));
    assert!(d.take_events().is_empty());
}
