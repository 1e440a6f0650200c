//! Internal error kinds that the core value types can raise.
//!
//! These are recoverable, protocol-level conditions (§7 of the design doc),
//! not generic I/O failures — callers that need a specific recovery action
//! (the forking router recovering from `MissingDimension`, a join reverting
//! on `Exhausted`) match on the variant. Crate boundaries still return
//! `anyhow::Result`; `CoreError` converts via `std::error::Error`.

use std::fmt;

use crate::Dimension;

/// Failures raised while classifying a [`crate::SpacePart`] against a CPE,
/// generating a [`crate::PartitionID`], or reading an empty store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    /// A non-forking CPE classification hit a dimension absent from the
    /// queried `SpacePart`.
    MissingDimension(Dimension),
    /// A `PartitionID` generator could not find an open sub-interval to
    /// draw from (bounds equal or inverted).
    Exhausted,
    /// `DataStore::get_partition_value` was called on a store with fewer
    /// than two items.
    EmptyStore,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDimension(dim) => {
                write!(f, "space part has no component for dimension {dim}")
            }
            Self::Exhausted => write!(f, "partition-id interval is exhausted"),
            Self::EmptyStore => write!(f, "data store has too few items to partition"),
        }
    }
}

impl std::error::Error for CoreError {}
