//! Events the dispatcher emits for whatever is consuming its results — the
//! interactive CLI in this workspace, but nothing here is CLI-specific.

use skiptree_core::NodeRef;
use skiptree_routing::{IdentityReply, LookupReply};

/// Something the dispatcher observed that the operator/CLI layer may want
/// to show, as opposed to state it mutates silently (`InsertData`, ring
/// repair bookkeeping).
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A `LookupReply` arrived addressed to this peer.
    LookupReply(LookupReply),
    /// An `IdentityReply` arrived addressed to this peer.
    IdentityReply(IdentityReply),
    /// This peer's own skip-tree join committed (`STJoinReply(CONFIRM)`).
    JoinCompleted,
    /// This peer's own join, or a join this peer was welcoming, failed.
    JoinFailed(String),
    /// A leave announcement was acknowledged by a ring neighbour.
    LeaveAcknowledged(NodeRef),
    /// This peer's own `leave()` completed (store was empty).
    LeaveCompleted,
    /// A send to `peer` failed; it has been dropped from the neighbourhood
    /// (§7, `PeerUnreachable`).
    PeerFailed(NodeRef),
}
