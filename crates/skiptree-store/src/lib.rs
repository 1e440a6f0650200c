//! Local data storage keyed by `SpacePart`, with per-dimension pivot
//! selection used by the skip-tree join protocol.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod comp_counter;
pub mod datastore;
pub mod error;

pub use comp_counter::{CompCounter, ItemId, PivotChoice};
pub use datastore::{DataStore, PartitionValue, PureData, StoredItem};
pub use error::StoreError;
