//! `Envelope` — the routing-layer taxonomy every wire message is wrapped
//! in (§6).

use serde::{Deserialize, Serialize};
use skiptree_core::{Direction, NameID, NodeRef, NumericID, SpacePart};

use crate::payload::Payload;
use crate::pid_range::PidRange;

/// Default hop budget for a fresh envelope (§4.6).
pub const DEFAULT_TTL: u8 = 16;

/// State threaded through a by-numeric envelope as it walks rings,
/// tracking the best candidate seen so far and whether the full ring has
/// been traversed (§4.6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ByNumericState {
    pub dest: NumericID,
    pub best: NodeRef,
    pub start: NodeRef,
    pub ring_level: usize,
    pub is_final: bool,
}

impl ByNumericState {
    #[must_use]
    pub fn new(dest: NumericID, origin: NodeRef) -> Self {
        Self {
            dest,
            best: origin.clone(),
            start: origin,
            ring_level: 0,
            is_final: false,
        }
    }
}

/// The routing-layer envelope taxonomy. Every variant carries a `Payload`
/// and, except `RouteDirect`, enough routing state to compute the next
/// hop without consulting anything beyond the local peer's own tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Envelope {
    /// Already resolved to a specific peer; no further routing decision.
    RouteDirect { dest: NodeRef, payload: Payload },
    /// Route towards a `NameID` along the level-0 (and up) SkipNet ring.
    RouteByName { name_id: NameID, payload: Payload },
    /// Route towards a `NumericID` along increasingly fine-grained rings.
    RouteByNumeric {
        state: ByNumericState,
        payload: Payload,
    },
    /// The payload itself determines routing policy (e.g. `SNFixupHigher`,
    /// whose scan direction and termination condition are bespoke); the
    /// handler for that payload type interprets and re-routes it.
    RouteByPayload { payload: Payload },
    /// By-CPE forking routing over a (possibly multi-dimensional) range.
    RouteByCpe {
        space_part: SpacePart,
        limit: PidRange,
        forking: bool,
        ttl: u8,
        payload: Payload,
    },
}

impl Envelope {
    /// Remaining hop budget, or `None` for variants without a TTL
    /// (only `RouteByCpe` carries one; other variants either resolve in a
    /// single hop or are re-wrapped as `RouteByCpe` once their target is
    /// known).
    #[must_use]
    pub fn ttl(&self) -> Option<u8> {
        match self {
            Self::RouteByCpe { ttl, .. } => Some(*ttl),
            _ => None,
        }
    }

    /// `true` once a `RouteByCpe` envelope's TTL has reached zero; such an
    /// envelope must be dropped silently rather than forwarded again.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::RouteByCpe { ttl: 0, .. })
    }

    /// Decrement TTL by one hop, saturating at zero. No-op for variants
    /// without a TTL.
    #[must_use]
    pub fn decremented(mut self) -> Self {
        if let Self::RouteByCpe { ttl, .. } = &mut self {
            *ttl = ttl.saturating_sub(1);
        }
        self
    }

    #[must_use]
    pub fn direction_towards(self_name_id: &NameID, dest_name_id: &NameID) -> Direction {
        if self_name_id > dest_name_id {
            Direction::Left
        } else {
            Direction::Right
        }
    }
}
