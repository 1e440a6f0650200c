//! Bounded, sorted neighbour tables for the SkipNet ring levels a peer
//! maintains (§4.5): one [`Ring`], split into a LEFT and a RIGHT
//! [`HalfRing`], per shared numeric-id prefix length.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod half_ring;
pub mod neighbourhood;
pub mod ring;

pub use half_ring::HalfRing;
pub use neighbourhood::Neighbourhood;
pub use ring::{by_name_get_direction, Ring};
