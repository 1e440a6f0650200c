//! Skip-tree join (§4.7.2) — the welcoming peer splits its CPE and data
//! store with the joiner, via a PROPOSE/ACCEPT/CONFIRM handshake guarded
//! by a busy flag on each side.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use rand::Rng;
use skiptree_core::{Cpe, Direction, NodeRef, PartitionID};
use skiptree_neighbourhood::{by_name_get_direction, Ring};
use skiptree_routing::{ControlPayload, Envelope, Payload, StJoinError, StJoinReply, StJoinReplyPhase, StJoinRequest};
use skiptree_store::{DataStore, ItemId};
use tracing::{debug, warn};

use crate::error::JoinError;

/// A welcoming peer's in-flight join: computed but not yet committed.
#[derive(Debug, Clone)]
pub struct PendingWelcome {
    pub joining_node: NodeRef,
    pub new_self_cpe: Cpe,
    pub items_to_remove: Vec<ItemId>,
}

/// Protocol state a welcoming peer carries across one join handshake.
#[derive(Debug, Default)]
pub struct WelcomeState {
    busy: bool,
    pending: Option<PendingWelcome>,
    started_at: Option<Instant>,
}

impl WelcomeState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether this welcome has been pending longer than `timeout` (§9 open
    /// question: the source has no join timeout at all).
    #[must_use]
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.busy
            && self
                .started_at
                .is_some_and(|started| started.elapsed() > timeout)
    }

    /// If this welcome has run longer than `timeout`, reset it and return
    /// the `STJoinError` to send back to the stalled joiner. Called by the
    /// heartbeat thread once per sweep.
    pub fn expire_if_stale(&mut self, timeout: Duration) -> Option<(NodeRef, Envelope)> {
        if !self.is_expired(timeout) {
            return None;
        }
        let joining_node = self.pending.as_ref().map(|p| p.joining_node.clone());
        self.reset();
        joining_node.map(|j| error_reply(j, "welcome timed out"))
    }

    /// Handle an incoming `STJoinRequest(ASK)` at the welcoming peer `W`.
    ///
    /// On success, returns the `STJoinReply(PROPOSE)` envelope to send to
    /// the joiner, and stashes the pending split until `ACCEPT` commits
    /// it. `self_store`/`self_cpe` are read but not mutated here — the
    /// commit happens in [`WelcomeState::accept`].
    ///
    /// # Errors
    /// [`JoinError::Busy`] if already welcoming another peer.
    /// [`JoinError::Inconsistent`] if `decide_side` cannot find a
    /// consistent ring slot on either side.
    /// [`JoinError::Store`]/[`JoinError::Core`] if the split itself fails.
    pub fn ask<R: Rng + ?Sized>(
        &mut self,
        self_ref: &NodeRef,
        self_cpe: &Cpe,
        self_store: &DataStore,
        ring0: &Ring,
        joining_node: NodeRef,
        rng: &mut R,
    ) -> Result<(NodeRef, Envelope), JoinError> {
        if self.busy {
            warn!(joiner = %joining_node.name_id, "refusing ASK, already welcoming another peer");
            return Ok(error_reply(joining_node, "peer is busy"));
        }
        self.busy = true;
        self.started_at = Some(Instant::now());

        let outcome = self.try_propose(self_ref, self_cpe, self_store, ring0, joining_node.clone(), rng);
        match outcome {
            Ok(reply) => {
                debug!(joiner = %joining_node.name_id, "proposed split to joiner");
                Ok(reply)
            }
            Err(e) => {
                self.busy = false;
                self.started_at = None;
                if matches!(e, JoinError::Inconsistent) {
                    warn!(joiner = %joining_node.name_id, "no consistent ring slot for joiner");
                    Ok(error_reply(joining_node, "inconsistent routing state"))
                } else {
                    Err(e)
                }
            }
        }
    }

    fn try_propose<R: Rng + ?Sized>(
        &mut self,
        self_ref: &NodeRef,
        self_cpe: &Cpe,
        self_store: &DataStore,
        ring0: &Ring,
        joining_node: NodeRef,
        rng: &mut R,
    ) -> Result<(NodeRef, Envelope), JoinError> {
        let j_side = decide_side(self_ref, ring0, &joining_node)?;
        let w_side = j_side.opposite();

        // The closest slot may be the joiner itself (already a
        // pre-established neighbour, e.g. from an earlier ping); the pid
        // bound must come from the next element past it (§4.7.2 step 2).
        let next = ring0
            .side(j_side)
            .entries()
            .iter()
            .find(|n| n.name_id != joining_node.name_id);
        let pid = compute_partition_id(rng, self_ref.partition_id, next, j_side)?;

        let split = self_store.get_partition_value(self_cpe, rng)?;
        let items_for_joiner = match j_side {
            Direction::Left => split.items_left,
            Direction::Right => split.items_right,
        };

        let joiner_cpe = self_cpe.extended(j_side, split.dimension.clone(), split.pivot.clone());
        let new_self_cpe = self_cpe.extended(w_side, split.dimension, split.pivot);
        let data_for_joiner = self_store.extract(&items_for_joiner);

        self.pending = Some(PendingWelcome {
            joining_node: joining_node.clone(),
            new_self_cpe,
            items_to_remove: items_for_joiner,
        });

        let reply = StJoinReply {
            contact: self_ref.clone(),
            phase: StJoinReplyPhase::Propose,
            partition_id: Some(pid),
            cpe: Some(joiner_cpe),
            data: data_for_joiner,
        };
        Ok((
            joining_node.clone(),
            Envelope::RouteDirect {
                dest: joining_node,
                payload: Payload::Control(ControlPayload::StJoinReply(reply)),
            },
        ))
    }

    /// Handle `STJoinRequest(ACCEPT)`: commit the pending CPE/store split
    /// and reply `STJoinReply(CONFIRM)`.
    ///
    /// # Errors
    /// [`JoinError::UnexpectedPhase`] if nothing is pending.
    pub fn accept(
        &mut self,
        self_ref: &NodeRef,
        self_store: &DataStore,
    ) -> Result<(Cpe, DataStore, NodeRef, Envelope), JoinError> {
        let pending = self.pending.take().ok_or(JoinError::UnexpectedPhase)?;
        let remove: HashSet<ItemId> = pending.items_to_remove.into_iter().collect();
        let committed_store = self_store.rebuild_without(&remove);

        debug!(joiner = %pending.joining_node.name_id, "committed split, confirming join");
        self.busy = false;
        self.started_at = None;
        let reply = StJoinReply {
            contact: self_ref.clone(),
            phase: StJoinReplyPhase::Confirm,
            partition_id: None,
            cpe: None,
            data: Vec::new(),
        };
        Ok((
            pending.new_self_cpe,
            committed_store,
            pending.joining_node.clone(),
            Envelope::RouteDirect {
                dest: pending.joining_node,
                payload: Payload::Control(ControlPayload::StJoinReply(reply)),
            },
        ))
    }

    /// Reset on `STJoinError` from the other side.
    pub fn reset(&mut self) {
        self.busy = false;
        self.started_at = None;
        self.pending = None;
    }
}

/// `decide_side`: find which half-ring of `W`'s level-0 ring the joiner
/// should be placed on, per §4.7.2 step 2.
///
/// # Errors
/// [`JoinError::Inconsistent`] if neither side's routing state is
/// consistent with the joiner's position.
fn decide_side(self_ref: &NodeRef, ring0: &Ring, joining_node: &NodeRef) -> Result<Direction, JoinError> {
    let primary = by_name_get_direction(&self_ref.name_id, &joining_node.name_id);
    if side_is_consistent(self_ref, ring0, joining_node, primary) {
        return Ok(primary);
    }
    let opposite = primary.opposite();
    if side_is_consistent(self_ref, ring0, joining_node, opposite) {
        return Ok(opposite);
    }
    Err(JoinError::Inconsistent)
}

fn side_is_consistent(self_ref: &NodeRef, ring0: &Ring, joining_node: &NodeRef, direction: Direction) -> bool {
    let side = ring0.side(direction);
    let Some(next) = side.nearest() else {
        // no ring neighbour on this side yet: any joiner is consistent.
        return true;
    };
    if next.name_id == joining_node.name_id {
        // closest slot is the joiner itself, already a pre-established
        // neighbour; still consistent, nothing further to check against.
        return true;
    }
    let can_wrap = side.can_wrap(&self_ref.name_id);
    skiptree_core::lies_between_direction(
        direction,
        &self_ref.name_id,
        &joining_node.name_id,
        &next.name_id,
        can_wrap,
    )
}

/// `compute_partition_id`: draw a fresh `pid` strictly between `W` and its
/// neighbour on the chosen side, falling back to an open-ended draw if
/// the neighbour's `pid` is inconsistent with that side or absent.
fn compute_partition_id<R: Rng + ?Sized>(
    rng: &mut R,
    self_pid: PartitionID,
    next: Option<&NodeRef>,
    side: Direction,
) -> Result<PartitionID, JoinError> {
    let next = next.filter(|n| match side {
        Direction::Right => n.partition_id > self_pid,
        Direction::Left => n.partition_id < self_pid,
    });

    let pid = match next {
        None => match side {
            Direction::Right => PartitionID::gen_aft(rng, self_pid)?,
            Direction::Left => PartitionID::gen_bef(rng, self_pid)?,
        },
        Some(n) => match side {
            Direction::Right => PartitionID::gen_btw(rng, self_pid, n.partition_id)?,
            Direction::Left => PartitionID::gen_btw(rng, n.partition_id, self_pid)?,
        },
    };
    debug_assert!(pid != self_pid);
    Ok(pid)
}

/// Build the `STJoinError` envelope sent back to a joiner whose request
/// could not be honoured, whatever the reason.
#[must_use]
pub fn error_reply(joining_node: NodeRef, reason: &str) -> (NodeRef, Envelope) {
    let original = StJoinRequest {
        joining_node: joining_node.clone(),
        phase: skiptree_routing::StJoinPhase::Ask,
    };
    (
        joining_node.clone(),
        Envelope::RouteDirect {
            dest: joining_node,
            payload: Payload::Control(ControlPayload::StJoinError(StJoinError {
                reason: reason.to_string(),
                original,
            })),
        },
    )
}
