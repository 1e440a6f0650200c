//! Failures raised while resolving an [`crate::Envelope`] to its next hop.

use std::fmt;

/// Recoverable conditions the routing engine itself can hit (§7). Both are
/// resolved by the caller, not propagated as a hard error: an expired
/// envelope is dropped silently, and empty routing triggers the payload's
/// own recovery (e.g. [`crate::LookupReply::routing_error`]) before being
/// dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RouteError {
    /// A `RouteByCpe` envelope's TTL reached zero before delivery.
    TtlExpired,
    /// By-CPE routing produced no destinations at all.
    EmptyRouting,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TtlExpired => write!(f, "envelope TTL expired before delivery"),
            Self::EmptyRouting => write!(f, "routing produced no destinations"),
        }
    }
}

impl std::error::Error for RouteError {}
