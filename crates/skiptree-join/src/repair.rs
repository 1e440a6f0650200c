//! Neighbourhood repair (§4.8): after any ring insertion, announce self to
//! the newly-added neighbours and propagate the discovery upward through
//! higher ring levels.

use skiptree_core::{Direction, NodeRef};
use skiptree_neighbourhood::Neighbourhood;
use skiptree_routing::{ControlPayload, Envelope, Payload, SnFixupHigher, SnPingMessage};
use tracing::debug;

/// One side's outcome of a `repair_level` call: who was newly added (to
/// ping) and, if anyone was, the `SNFixupHigher` probe to launch.
#[derive(Debug, Clone, Default)]
pub struct RepairOutcome {
    pub pings: Vec<(NodeRef, Envelope)>,
    pub fixups: Vec<(NodeRef, Envelope)>,
}

/// `repair_level(ring_level, candidate_neighbours)`: add every candidate
/// to both half-rings at `ring_level`; for each side that actually grew,
/// ping every peer now on that side and kick off an `SNFixupHigher` probe
/// in that direction.
pub fn repair_level(
    self_ref: &NodeRef,
    neighbourhood: &mut Neighbourhood,
    ring_level: usize,
    candidates: &[NodeRef],
) -> RepairOutcome {
    let mut grew = [false, false]; // [left, right]
    for candidate in candidates {
        if neighbourhood.add_neighbour(ring_level, candidate.clone()) {
            let direction = skiptree_neighbourhood::by_name_get_direction(
                &self_ref.name_id,
                &candidate.name_id,
            );
            match direction {
                Direction::Left => grew[0] = true,
                Direction::Right => grew[1] = true,
            }
        }
    }

    let mut outcome = RepairOutcome::default();
    for (direction, did_grow) in [(Direction::Left, grew[0]), (Direction::Right, grew[1])] {
        if !did_grow {
            continue;
        }
        debug!(ring_level, ?direction, "side grew, announcing self and fixing up higher levels");
        let side = neighbourhood.ring(ring_level).side(direction);
        for peer in side.entries() {
            outcome.pings.push((
                peer.clone(),
                Envelope::RouteDirect {
                    dest: peer.clone(),
                    payload: Payload::Control(ControlPayload::SnPingMessage(SnPingMessage {
                        src: self_ref.clone(),
                        ring_level,
                    })),
                },
            ));
        }

        if let Some(first_hop) = side.nearest() {
            outcome.fixups.push((
                first_hop.clone(),
                Envelope::RouteDirect {
                    dest: first_hop.clone(),
                    payload: Payload::Control(ControlPayload::SnFixupHigher(SnFixupHigher {
                        src: self_ref.clone(),
                        ring_level,
                        direction,
                    })),
                },
            ));
        }
    }
    outcome
}

/// What the local dispatcher should do with an `SNFixupHigher` probe it
/// just received (or originated).
#[derive(Debug, Clone)]
pub enum FixupStep {
    /// Stop scanning: the ring has wrapped, or `src` was reached, or a
    /// closer peer than `src` already covers this direction.
    Stop,
    /// A peer with a deeper shared numeric-id prefix than `ring_level` was
    /// found: collect its neighbours one level up and send them back to
    /// `src` for `repair_level(ring_level + 1, ...)`.
    FoundHigher {
        collected: Vec<NodeRef>,
        send_to: NodeRef,
    },
    /// Keep walking: forward to the next peer in `direction` at
    /// `ring_level`.
    Forward(NodeRef),
}

/// Advance an `SNFixupHigher(src, ring_level, direction)` probe by one hop,
/// from `self_ref`'s point of view.
#[must_use]
pub fn step_fixup_higher(
    self_ref: &NodeRef,
    neighbourhood: &Neighbourhood,
    src: &NodeRef,
    ring_level: usize,
    direction: Direction,
) -> FixupStep {
    if src.name_id == self_ref.name_id {
        debug!(ring_level, ?direction, "fixup probe returned to its source, stopping");
        return FixupStep::Stop;
    }

    let side = neighbourhood.ring(ring_level).side(direction);
    let closest_name = side.nearest().map(|n| n.name_id.clone());
    if let Some(closest) = &closest_name {
        let can_wrap = side.can_wrap(&self_ref.name_id);
        if !skiptree_core::lies_between_direction(
            direction,
            &self_ref.name_id,
            &src.name_id,
            closest,
            can_wrap,
        ) {
            debug!(ring_level, ?direction, "closer peer already covers this direction, stopping fixup");
            return FixupStep::Stop;
        }
    }

    let shared_prefix = src.numeric_id.longest_prefix_length(self_ref.numeric_id);
    if shared_prefix as usize > ring_level {
        debug!(ring_level, src = %src.name_id, "deeper numeric prefix found, reporting higher-level neighbours");
        return FixupStep::FoundHigher {
            collected: neighbourhood.ring(ring_level + 1).unique_neighbours(),
            send_to: src.clone(),
        };
    }

    match side.nearest() {
        Some(next) => FixupStep::Forward(next.clone()),
        None => FixupStep::Stop,
    }
}

/// Ping every peer at `ring_level`, both directions. Used by the heartbeat
/// thread (default every 10 min) to detect peers that silently dropped.
#[must_use]
pub fn ping_full_ring(self_ref: &NodeRef, neighbourhood: &Neighbourhood, ring_level: usize) -> Vec<(NodeRef, Envelope)> {
    debug!(ring_level, "heartbeat sweep pinging full ring");
    let mut out = Vec::new();
    for direction in [Direction::Left, Direction::Right] {
        for peer in neighbourhood.ring(ring_level).side(direction).entries() {
            out.push((
                peer.clone(),
                Envelope::RouteDirect {
                    dest: peer.clone(),
                    payload: Payload::Control(ControlPayload::SnPingMessage(SnPingMessage {
                        src: self_ref.clone(),
                        ring_level,
                    })),
                },
            ));
        }
    }
    out
}

/// `fix_from_level(level)`: originate an `SNFixupHigher` probe in both
/// directions starting at `level`, to discover neighbours one ring higher
/// than what this peer currently knows. Run unconditionally by the
/// heartbeat thread and after every committed skip-tree join.
#[must_use]
pub fn fix_from_level(self_ref: &NodeRef, neighbourhood: &Neighbourhood, level: usize) -> Vec<(NodeRef, Envelope)> {
    debug!(level, "originating fixup probe to discover higher-level neighbours");
    let mut out = Vec::new();
    for direction in [Direction::Left, Direction::Right] {
        if let Some(first_hop) = neighbourhood.ring(level).side(direction).nearest() {
            out.push((
                first_hop.clone(),
                Envelope::RouteDirect {
                    dest: first_hop.clone(),
                    payload: Payload::Control(ControlPayload::SnFixupHigher(SnFixupHigher {
                        src: self_ref.clone(),
                        ring_level: level,
                        direction,
                    })),
                },
            ));
        }
    }
    out
}
