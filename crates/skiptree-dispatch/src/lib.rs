//! Per-peer aggregate state, the ingress dispatcher, and the egress
//! socket map (§5). This crate is transport-agnostic: `skiptree-net`
//! drives it from real sockets, tests drive it with in-memory queues.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod app_event;
pub mod dispatcher;
pub mod egress;
pub mod error;
pub mod heartbeat;
pub mod local_node;
pub mod pending;

pub use app_event::AppEvent;
pub use dispatcher::Dispatcher;
pub use egress::{is_large_frame, EgressManager, LARGE_FRAME_THRESHOLD};
pub use error::DispatchError;
pub use local_node::{JoinerState, LocalNode};
pub use pending::PendingQueue;
