//! Failures the dispatcher itself can raise, as opposed to the ones it
//! recovers from internally (join busy/inconsistent, TTL expiry, empty
//! routing — all handled in place per §7).

use std::fmt;

use skiptree_core::CoreError;
use skiptree_join::JoinError;
use skiptree_store::StoreError;

/// Failures surfaced to the operator/CLI layer.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DispatchError {
    /// `leave()` was called with a non-empty store (§9 open question,
    /// resolved as refuse-to-leave-if-nonempty rather than redistribute).
    NonEmptyStore,
    Join(JoinError),
    Core(CoreError),
    Store(StoreError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonEmptyStore => {
                write!(f, "refusing to leave: local store is not empty")
            }
            Self::Join(e) => write!(f, "{e}"),
            Self::Core(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<JoinError> for DispatchError {
    fn from(e: JoinError) -> Self {
        Self::Join(e)
    }
}

impl From<CoreError> for DispatchError {
    fn from(e: CoreError) -> Self {
        Self::Core(e)
    }
}

impl From<StoreError> for DispatchError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
