//! Identifiers, space types, and the Characteristic Plane Equation (CPE)
//! shared across the skiptree workspace.
//!
//! This crate has no notion of sockets, threads, or a dispatcher — it is
//! the pure value layer every other crate builds on:
//! - identifiers and their orderings (`NameID`, `NumericID`, `PartitionID`)
//! - the multi-dimensional key-space model (`Dimension`, `Range`,
//!   `Component`, `SpacePart`)
//! - the skip-tree path of split decisions (`InternalNode`, `Cpe`)
//! - a non-owning peer descriptor (`NodeRef`)
//! - CBOR wire helpers shared by every envelope/payload type

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod component;
pub mod config;
pub mod cpe;
pub mod dimension;
pub mod error;
pub mod identifiers;
pub mod node;
pub mod range;
pub mod space_part;
pub mod value;
pub mod wire;

pub use component::{Component, ComponentValue};
pub use config::NodeConfig;
pub use cpe::{Cpe, InternalNode, SideClassification};
pub use dimension::Dimension;
pub use error::CoreError;
pub use identifiers::{lies_between_direction, Direction, NameID, NumericID, PartitionID, NUMERIC_ID_BITS};
pub use node::NodeRef;
pub use range::Range;
pub use space_part::SpacePart;
pub use value::Value;
pub use wire::{from_cbor, to_cbor, Versioned, WIRE_VERSION};
