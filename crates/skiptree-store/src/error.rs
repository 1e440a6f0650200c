use std::fmt;

/// Failures raised by the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// Fewer than two items are stored, so no dimension can be split into
    /// two non-empty sides (§9 open question: undefined in the source,
    /// resolved here as a hard error rather than a panic).
    EmptyStore,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyStore => write!(f, "data store has fewer than two items to partition"),
        }
    }
}

impl std::error::Error for StoreError {}
