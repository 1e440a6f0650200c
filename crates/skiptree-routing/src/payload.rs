//! Control and application payloads (§6) — the message bodies an
//! [`crate::envelope::Envelope`] ultimately carries.

use serde::{Deserialize, Serialize};
use skiptree_core::{Cpe, NodeRef, PartitionID, SpacePart};

use crate::envelope::Envelope;

/// `SNJoinRequest`'s state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnJoinState {
    Seed,
    Routing,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnJoinRequest {
    pub state: SnJoinState,
    pub joining_node: NodeRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnJoinReply {
    pub neighbours: Vec<NodeRef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnLeaveRequest {
    pub leaving_node: NodeRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnLeaveReply {
    pub contacted_node: NodeRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnPingMessage {
    pub src: NodeRef,
    pub ring_level: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnPingRequest {
    pub src: NodeRef,
    pub ring_level: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnFixupHigher {
    pub src: NodeRef,
    pub ring_level: usize,
    pub direction: skiptree_core::Direction,
}

/// Carries the neighbours collected by an `SnFixupHigher` probe back to
/// its originator, so it can call `repair_level(ring_level + 1, ...)`
/// (§4.8) — not itself named in the source taxonomy, which only says the
/// probe "returns to src"; this is the message that return trip sends.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnFixupCollected {
    pub ring_level: usize,
    pub neighbours: Vec<NodeRef>,
}

/// `STJoinRequest`'s state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StJoinPhase {
    Ask,
    Accept,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StJoinRequest {
    pub joining_node: NodeRef,
    pub phase: StJoinPhase,
}

/// `STJoinReply`'s state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StJoinReplyPhase {
    Propose,
    Confirm,
    Error,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StJoinReply {
    pub contact: NodeRef,
    pub phase: StJoinReplyPhase,
    /// Only meaningful for `Propose`.
    pub partition_id: Option<PartitionID>,
    pub cpe: Option<Cpe>,
    /// `(key, data)` pairs handed from the welcoming peer to the joiner.
    pub data: Vec<(SpacePart, Vec<u8>)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StJoinError {
    pub reason: String,
    /// The request that failed, for the recipient to reset its own state.
    pub original: StJoinRequest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsertData {
    /// Must be a point `SpacePart` (every dimension a single value).
    pub key: SpacePart,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupRequest {
    /// May be a true range over one or more dimensions.
    pub key: SpacePart,
    pub originator: NodeRef,
    pub nonce: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupReply {
    pub nonce: u64,
    pub data: Vec<(SpacePart, Vec<u8>)>,
    /// Peers the query fanned out through, for operator-visible tracing.
    pub trace: Vec<NodeRef>,
    /// Set instead of `data` when the query could not be routed at all
    /// (§7, `EmptyRouting`'s `routing_error()` recovery for `LookupRequest`).
    pub error: Option<String>,
}

impl LookupReply {
    #[must_use]
    pub fn found(nonce: u64, data: Vec<(SpacePart, Vec<u8>)>, trace: Vec<NodeRef>) -> Self {
        Self { nonce, data, trace, error: None }
    }

    #[must_use]
    pub fn routing_error(nonce: u64, reason: impl Into<String>) -> Self {
        Self { nonce, data: Vec::new(), trace: Vec::new(), error: Some(reason.into()) }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityRequest {
    pub from: NodeRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdentityReply {
    pub node: NodeRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncapsulatedMessage {
    pub inner_envelope: Box<Envelope>,
}

/// Everything a join message or heartbeat/repair message might carry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ControlPayload {
    SnJoinRequest(SnJoinRequest),
    SnJoinReply(SnJoinReply),
    SnLeaveRequest(SnLeaveRequest),
    SnLeaveReply(SnLeaveReply),
    SnPingMessage(SnPingMessage),
    SnPingRequest(SnPingRequest),
    SnFixupHigher(SnFixupHigher),
    SnFixupCollected(SnFixupCollected),
    StJoinRequest(StJoinRequest),
    StJoinReply(StJoinReply),
    StJoinError(StJoinError),
}

/// Everything a client operation (or the operator CLI acting as a client)
/// might carry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ApplicationPayload {
    InsertData(InsertData),
    LookupRequest(LookupRequest),
    LookupReply(LookupReply),
    IdentityRequest(IdentityRequest),
    IdentityReply(IdentityReply),
    Encapsulated(EncapsulatedMessage),
}

/// The body an [`Envelope`] carries: either overlay-maintenance traffic or
/// an application-level operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Payload {
    Control(ControlPayload),
    Application(ApplicationPayload),
}

impl From<ControlPayload> for Payload {
    fn from(p: ControlPayload) -> Self {
        Self::Control(p)
    }
}

impl From<ApplicationPayload> for Payload {
    fn from(p: ApplicationPayload) -> Self {
        Self::Application(p)
    }
}
