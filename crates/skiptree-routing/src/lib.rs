//! The envelope taxonomy and next-hop computation for the skiptree
//! overlay (§4.6, §6): direct, by-name, by-numeric, and the core by-CPE
//! forking router.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod by_cpe;
pub mod by_name;
pub mod by_numeric;
pub mod direct;
pub mod envelope;
pub mod error;
pub mod insertion;
pub mod payload;
pub mod pid_range;

pub use by_cpe::{route_by_cpe, RoutingStep};
pub use by_name::next_hop_by_name;
pub use by_numeric::{step_by_numeric, ByNumericOutcome};
pub use direct::route_direct;
pub use envelope::{ByNumericState, Envelope, DEFAULT_TTL};
pub use error::RouteError;
pub use insertion::synthesize_missing_dimensions;
pub use payload::{
    ApplicationPayload, ControlPayload, EncapsulatedMessage, IdentityReply, IdentityRequest,
    InsertData, LookupReply, LookupRequest, Payload, SnFixupCollected, SnFixupHigher,
    SnJoinReply, SnJoinRequest, SnJoinState, SnLeaveReply, SnLeaveRequest, SnPingMessage,
    SnPingRequest, StJoinError, StJoinPhase, StJoinRequest, StJoinReply, StJoinReplyPhase,
};
pub use pid_range::{includes_pid, PidRange};
