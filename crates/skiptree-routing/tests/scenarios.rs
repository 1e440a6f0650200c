//! End-to-end routing scenarios over a small two-peer skip-tree, built
//! directly from `route_by_cpe` rather than through a dispatcher.

use skiptree_core::{Component, Cpe, Dimension, Direction, InternalNode, NameID, NodeRef, NumericID, PartitionID, SpacePart, Value};
use skiptree_neighbourhood::Neighbourhood;
use skiptree_routing::{
    route_by_cpe, ApplicationPayload, IdentityRequest, Payload, PidRange, RoutingStep,
};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

fn node_at(name: &str, pid: f64, cpe: Cpe) -> NodeRef {
    NodeRef::new(
        NameID::new(name),
        NumericID::from_seed(name.as_bytes()),
        PartitionID::from_raw(pid),
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000)),
        cpe,
    )
}

fn dummy_payload(from: &NodeRef) -> Payload {
    ApplicationPayload::IdentityRequest(IdentityRequest { from: from.clone() }).into()
}

fn range_part(dim: &str, lo: i64, hi: i64) -> SpacePart {
    let mut p = SpacePart::new();
    p.set_component(Component::range(
        Dimension::new(dim),
        skiptree_core::Range::closed(Value::int(lo), Value::int(hi)),
    ));
    p
}

/// Two peers, split once on `x` at pivot `5`: `a` (name < `m`) owns
/// `x <= 5`, `m` owns `x >= 5` and knows `a` as its level-0 left neighbour
/// — the state one `STJoinRequest(ACCEPT)` leaves behind (§4.7.2).
fn split_pair() -> (NodeRef, NodeRef, Neighbourhood) {
    let mut a_cpe = Cpe::new();
    a_cpe.add_node(Direction::Left, Dimension::new("x"), Value::int(5));
    let a = node_at("a", 0.25, a_cpe);

    let mut m_cpe = Cpe::new();
    m_cpe.add_node(Direction::Right, Dimension::new("x"), Value::int(5));
    let m = node_at("m", 0.75, m_cpe);

    let mut nb = Neighbourhood::new(m.name_id.clone(), 8);
    nb.add_neighbour(0, a.clone());
    (m, a, nb)
}

#[test]
fn range_query_straddling_the_split_reaches_both_peers() {
    let (m, a, nb) = split_pair();
    let query = range_part("x", 0, 10);
    let payload = dummy_payload(&m);

    let steps = route_by_cpe(
        &m,
        &m.cpe,
        m.partition_id,
        &nb,
        &query,
        &PidRange::unbounded(),
        true,
        16,
        &payload,
    )
    .unwrap();

    let delivers: Vec<&NodeRef> = steps
        .iter()
        .filter_map(|s| match s {
            RoutingStep::Deliver { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert!(delivers.iter().any(|n| n.name_id == m.name_id), "query must resolve locally on m's side of the split");
    assert!(delivers.iter().any(|n| n.name_id == a.name_id), "query must also reach a across the split");
}

#[test]
fn query_missing_the_split_dimension_forks_to_the_neighbour_anyway() {
    let (m, a, nb) = split_pair();
    // A query over an unrelated dimension: neither peer's cpe splits on
    // "y", so `which_side_space(.., forking = true)` must treat the
    // missing "x" split as "could be on either side" (§4.2) rather than
    // erroring the way a non-forking insert would.
    let mut query = SpacePart::new();
    query.set_component(Component::point(Dimension::new("y"), Value::int(1)));
    let payload = dummy_payload(&m);

    let steps = route_by_cpe(
        &m,
        &m.cpe,
        m.partition_id,
        &nb,
        &query,
        &PidRange::unbounded(),
        true,
        16,
        &payload,
    )
    .unwrap();

    let delivers: Vec<&NodeRef> = steps
        .iter()
        .filter_map(|s| match s {
            RoutingStep::Deliver { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert!(delivers.iter().any(|n| n.name_id == m.name_id));
    assert!(
        delivers.iter().any(|n| n.name_id == a.name_id),
        "a dimension absent from the query must fork towards a, not just resolve at m"
    );
}

#[test]
fn non_forking_insert_errors_on_a_missing_split_dimension() {
    let (m, _a, nb) = split_pair();
    let mut query = SpacePart::new();
    query.set_component(Component::point(Dimension::new("y"), Value::int(1)));
    let payload = dummy_payload(&m);

    let err = route_by_cpe(
        &m,
        &m.cpe,
        m.partition_id,
        &nb,
        &query,
        &PidRange::unbounded(),
        false,
        16,
        &payload,
    )
    .unwrap_err();
    assert_eq!(err, skiptree_core::CoreError::MissingDimension(Dimension::new("x")));
}

#[test]
fn internal_node_is_here_respects_direction() {
    let node = InternalNode::new(Direction::Right, Dimension::new("x"), Value::int(5));
    let covers = skiptree_core::Range::closed(Value::int(0), Value::int(10));
    assert!(node.is_here(&covers));
}
