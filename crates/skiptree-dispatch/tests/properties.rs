//! Property test: on a lone peer, every inserted key is recoverable by an
//! exact-point lookup, whatever the key's value or insertion order.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use skiptree_core::{Component, Cpe, Dimension, NameID, NodeConfig, NodeRef, NumericID, PartitionID, SpacePart, Value};
use skiptree_dispatch::{AppEvent, Dispatcher, LocalNode};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

fn dispatcher(seed: u64) -> Dispatcher<StdRng> {
    let self_ref = NodeRef::new(
        NameID::new("m"),
        NumericID::from_seed(b"m"),
        PartitionID::from_raw(0.5),
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000)),
        Cpe::new(),
    );
    Dispatcher::new(LocalNode::new(self_ref, NodeConfig::default()), StdRng::seed_from_u64(seed))
}

fn point(v: i64) -> SpacePart {
    let mut p = SpacePart::new();
    p.set_component(Component::point(Dimension::new("x"), Value::int(v)));
    p
}

proptest! {
    #[test]
    fn every_inserted_key_is_found_by_its_own_lookup(seed in any::<u64>(), keys in prop::collection::vec(-10_000i64..10_000, 1..16)) {
        let mut d = dispatcher(seed);
        for (i, &k) in keys.iter().enumerate() {
            prop_assert!(d.insert_routed(point(k), (i as u64).to_le_bytes().to_vec()).is_empty());
        }

        for &k in &keys {
            prop_assert!(d.lookup(point(k), 1).is_empty());
            let events = d.take_events();
            let found = events.iter().any(|e| matches!(e, AppEvent::LookupReply(r) if r.data.iter().any(|(sp, _)| sp == &point(k))));
            prop_assert!(found, "key {k} inserted but not found by lookup");
        }
    }
}
