//! Netstring wire framing, the TCP listener thread, and the egress
//! connector that drives `skiptree-dispatch`'s transport-agnostic egress
//! manager over real sockets (§5, §6).

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod codec;
pub mod connector;
pub mod error;
pub mod framing;
pub mod listener;
pub mod outbound;

pub use codec::{decode_envelope, encode_envelope};
pub use connector::tcp_connector;
pub use error::WireError;
pub use framing::{read_frame, write_frame};
pub use listener::run as run_listener;
pub use outbound::deliver;
