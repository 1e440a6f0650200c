//! `NodeConfig` — the tunables the spec calls out with concrete defaults.
//!
//! There is no configuration file in the source system; every value here is
//! populated from CLI flags in `skiptree-cli` and falls back to the
//! defaults below, matching the original's hardcoded constants.

use std::time::Duration;

/// Tunable parameters for a running peer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeConfig {
    /// Bound on each half-ring's size (0 = unbounded).
    pub half_ring_bound: usize,
    /// Default TTL stamped on newly originated envelopes.
    pub default_ttl: u8,
    /// Period between heartbeat sweeps.
    pub heartbeat_period: Duration,
    /// Idle egress-channel timeout before the cleaner closes it.
    pub idle_channel_timeout: Duration,
    /// Maximum accepted netstring frame length.
    pub max_frame_bytes: usize,
    /// Wall-clock deadline for a single join attempt before it is
    /// abandoned and the busy flag cleared (open question in §9,
    /// resolved here since the source has no timeout at all).
    pub join_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            half_ring_bound: 16,
            default_ttl: 16,
            heartbeat_period: Duration::from_secs(10 * 60),
            idle_channel_timeout: Duration::from_secs(54 * 60),
            max_frame_bytes: 16 * 1024 * 1024,
            join_timeout: Duration::from_secs(30),
        }
    }
}
