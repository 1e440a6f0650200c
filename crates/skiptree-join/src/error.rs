use std::fmt;

/// Failures raised while running the join protocols.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum JoinError {
    /// The welcoming peer is already mid-way through another join.
    Busy,
    /// Neither side of the level-0 ring yielded a consistent next slot for
    /// `decide_side` — the routing state that placed this `ASK` here
    /// disagrees with the welcoming peer's own ring view. Resolved here as
    /// a hard error rather than a silent best-effort guess (§9 open
    /// question).
    Inconsistent,
    /// The welcoming peer's data store could not be split (too few items).
    Store(skiptree_store::StoreError),
    /// A `PartitionID` could not be drawn for the chosen side.
    Core(skiptree_core::CoreError),
    /// A message arrived for a join phase that does not match local state
    /// (e.g. `ACCEPT` with nothing pending).
    UnexpectedPhase,
    /// No response was received from the other side within the configured
    /// join timeout (§9 open question, resolved here with an explicit
    /// timeout rather than waiting indefinitely).
    Timeout,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "peer is already welcoming another join"),
            Self::Inconsistent => write!(f, "inconsistent routing state while deciding join side"),
            Self::Store(e) => write!(f, "store error during join: {e}"),
            Self::Core(e) => write!(f, "core error during join: {e}"),
            Self::UnexpectedPhase => write!(f, "join message arrived for an unexpected phase"),
            Self::Timeout => write!(f, "join timed out waiting for a reply"),
        }
    }
}

impl std::error::Error for JoinError {}

impl From<skiptree_store::StoreError> for JoinError {
    fn from(e: skiptree_store::StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<skiptree_core::CoreError> for JoinError {
    fn from(e: skiptree_core::CoreError) -> Self {
        Self::Core(e)
    }
}
