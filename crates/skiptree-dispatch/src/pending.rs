//! Pending-route queue: by-CPE envelopes held back because their next hop
//! had not completed its skip-tree join (§4.6 step 4, the
//! routing-table-complement case).

use std::collections::HashMap;

use skiptree_core::NameID;
use skiptree_routing::Envelope;

/// Envelopes deferred at a specific not-yet-ST-complete neighbour, keyed
/// by that neighbour's `NameID`.
#[derive(Debug, Default)]
pub struct PendingQueue {
    by_neighbour: HashMap<NameID, Vec<Envelope>>,
}

impl PendingQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer(&mut self, at: NameID, envelope: Envelope) {
        self.by_neighbour.entry(at).or_default().push(envelope);
    }

    /// Remove and return every envelope deferred at `name_id`, e.g. once
    /// that peer's `Cpe` is observed to be non-empty.
    pub fn drain(&mut self, name_id: &NameID) -> Vec<Envelope> {
        self.by_neighbour.remove(name_id).unwrap_or_default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_neighbour.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_neighbour.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiptree_routing::{ApplicationPayload, IdentityRequest, Payload};
    use skiptree_core::{Cpe, NumericID, PartitionID};
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    fn envelope() -> Envelope {
        let from = skiptree_core::NodeRef::new(
            NameID::new("a"),
            NumericID::from_seed(b"a"),
            PartitionID::from_raw(0.5),
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000)),
            Cpe::new(),
        );
        Envelope::RouteDirect {
            dest: from.clone(),
            payload: Payload::Application(ApplicationPayload::IdentityRequest(IdentityRequest {
                from,
            })),
        }
    }

    #[test]
    fn drain_returns_and_clears_deferred_envelopes() {
        let mut q = PendingQueue::new();
        let key = NameID::new("z");
        q.defer(key.clone(), envelope());
        q.defer(key.clone(), envelope());
        assert_eq!(q.len(), 2);

        let drained = q.drain(&key);
        assert_eq!(drained.len(), 2);
        assert!(q.is_empty());
        assert!(q.drain(&key).is_empty());
    }
}
