//! `LocalNode` — the per-peer aggregate state: identity, CPE, data store,
//! neighbourhood, and join-protocol state. Every mutation happens on the
//! dispatcher thread (§5), so this struct itself carries no internal
//! locking.

use std::time::{Duration, Instant};

use skiptree_core::NodeConfig;
use skiptree_core::NodeRef;
use skiptree_join::WelcomeState;
use skiptree_neighbourhood::Neighbourhood;
use skiptree_store::DataStore;

/// A joining peer's own busy flag, held from the moment it sends
/// `STJoinRequest(ASK)` until it receives `STJoinReply(CONFIRM)` or
/// `STJoinError` (§4.7.2, §5 causal-ordering guarantee).
///
/// Tracks when it went busy so the heartbeat can enforce the join timeout
/// the source has no equivalent of (§9 open question).
#[derive(Debug, Default)]
pub struct JoinerState {
    busy: bool,
    started_at: Option<Instant>,
}

impl JoinerState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_busy(&mut self) {
        self.busy = true;
        self.started_at = Some(Instant::now());
    }

    pub fn clear(&mut self) {
        self.busy = false;
        self.started_at = None;
    }

    /// Whether this join has been in flight longer than `timeout`.
    #[must_use]
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.busy
            && self
                .started_at
                .is_some_and(|started| started.elapsed() > timeout)
    }
}

/// The full mutable state of one peer in the overlay.
pub struct LocalNode {
    /// This peer's own identifiers, address, and (once it has joined the
    /// skip-tree) `Cpe` and `PartitionID`.
    pub self_ref: NodeRef,
    pub store: DataStore,
    pub neighbourhood: Neighbourhood,
    /// State held while welcoming another peer's skip-tree join.
    pub welcome: WelcomeState,
    /// State held while this peer's own skip-tree join is in flight.
    pub joiner: JoinerState,
    pub config: NodeConfig,
}

impl LocalNode {
    #[must_use]
    pub fn new(self_ref: NodeRef, config: NodeConfig) -> Self {
        let bound = config.half_ring_bound;
        Self {
            neighbourhood: Neighbourhood::new(self_ref.name_id.clone(), bound),
            self_ref,
            store: DataStore::new(),
            welcome: WelcomeState::new(),
            joiner: JoinerState::new(),
            config,
        }
    }

    #[must_use]
    pub fn is_st_complete(&self) -> bool {
        !self.self_ref.is_st_incomplete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiptree_core::{Cpe, NameID, NumericID, PartitionID};
    use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

    #[test]
    fn fresh_node_is_st_incomplete() {
        let self_ref = NodeRef::new(
            NameID::new("m"),
            NumericID::from_seed(b"m"),
            PartitionID::from_raw(0.5),
            SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 9000)),
            Cpe::new(),
        );
        let node = LocalNode::new(self_ref, NodeConfig::default());
        assert!(!node.is_st_complete());
        assert_eq!(node.neighbourhood.levels(), skiptree_core::NUMERIC_ID_BITS as usize + 1);
    }
}
