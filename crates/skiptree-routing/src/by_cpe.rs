//! By-CPE forking routing — the core skip-tree range-query algorithm
//! (§4.6).

use skiptree_core::{CoreError, Cpe, Direction, NodeRef, PartitionID, SpacePart};
use skiptree_neighbourhood::Neighbourhood;

use crate::envelope::Envelope;
use crate::payload::Payload;
use crate::pid_range::{includes_pid, PidRange};

/// One action the local dispatcher should take as a result of routing a
/// `RouteByCpe` envelope. Routing itself never performs I/O; it only
/// describes what ought to happen next.
#[derive(Debug, Clone)]
pub enum RoutingStep {
    /// Send `envelope` to `to` now (local delivery if `to == self`).
    Deliver { to: NodeRef, envelope: Envelope },
    /// `to` has not completed its skip-tree join; hold `envelope` until it
    /// has, instead of forwarding immediately.
    Defer { at: NodeRef, envelope: Envelope },
    /// Send a routing-table-complement solicitation directly to `to`.
    Direct { to: NodeRef, envelope: Envelope },
}

#[must_use]
fn goes_forward(direction: Direction, left: bool, right: bool) -> bool {
    match direction {
        Direction::Left => left,
        Direction::Right => right,
    }
}

#[must_use]
fn goes_backward(direction: Direction, left: bool, right: bool) -> bool {
    match direction {
        Direction::Left => right,
        Direction::Right => left,
    }
}

/// Route one `RouteByCpe` envelope one step further, from `self_ref`'s
/// point of view.
///
/// `forking` controls only the local classification at step 1 (the
/// outer call); neighbour classification during the directional scan
/// always tolerates missing dimensions, mirroring the source algorithm.
///
/// # Errors
/// Returns [`CoreError::MissingDimension`] only when `forking` is `false`
/// (insertion routing) and `self_cpe` splits on a dimension `space_part`
/// does not carry — which should not happen once the caller has
/// synthesised virtual ranges for every split dimension.
#[allow(clippy::too_many_arguments)]
pub fn route_by_cpe(
    self_ref: &NodeRef,
    self_cpe: &Cpe,
    self_partition_id: PartitionID,
    neighbourhood: &Neighbourhood,
    space_part: &SpacePart,
    limit: &PidRange,
    forking: bool,
    ttl: u8,
    payload: &Payload,
) -> Result<Vec<RoutingStep>, CoreError> {
    let mut steps = Vec::new();
    let classification = self_cpe.which_side_space(space_part, forking)?;

    if classification.here {
        steps.push(RoutingStep::Deliver {
            to: self_ref.clone(),
            envelope: Envelope::RouteByCpe {
                space_part: space_part.clone(),
                limit: PidRange::point(self_partition_id),
                forking,
                ttl,
                payload: payload.clone(),
            },
        });
    }

    let directions: [(Direction, PidRange, bool); 2] = [
        (
            Direction::Left,
            limit.restrict(Direction::Right, self_partition_id),
            classification.left,
        ),
        (
            Direction::Right,
            limit.restrict(Direction::Left, self_partition_id),
            classification.right,
        ),
    ];

    for (direction, initial_sub_range, enabled) in directions {
        if !enabled {
            continue;
        }
        scan_direction(
            self_ref,
            neighbourhood,
            space_part,
            initial_sub_range,
            direction,
            ttl,
            forking,
            payload,
            &mut steps,
        );
    }

    Ok(steps)
}

#[allow(clippy::too_many_arguments)]
fn scan_direction(
    self_ref: &NodeRef,
    neighbourhood: &Neighbourhood,
    space_part: &SpacePart,
    mut sub_range: PidRange,
    direction: Direction,
    ttl: u8,
    forking: bool,
    payload: &Payload,
    steps: &mut Vec<RoutingStep>,
) {
    let mut last_seen = None;

    for level in (0..neighbourhood.levels()).rev() {
        let side = neighbourhood.ring(level).side(direction);
        let size = side.len();
        if size == 0 || (level > 0 && size < 2) {
            continue;
        }

        let Some(nh) = side.nearest() else {
            continue;
        };
        if last_seen.as_ref() == Some(&nh.name_id) {
            continue;
        }
        last_seen = Some(nh.name_id.clone());

        if nh.is_st_incomplete() {
            steps.push(RoutingStep::Defer {
                at: nh.clone(),
                envelope: Envelope::RouteByCpe {
                    space_part: space_part.clone(),
                    limit: sub_range,
                    forking,
                    ttl,
                    payload: payload.clone(),
                },
            });
            steps.push(RoutingStep::Direct {
                to: nh.clone(),
                envelope: Envelope::RouteDirect {
                    dest: nh.clone(),
                    payload: crate::payload::ControlPayload::SnPingRequest(
                        crate::payload::SnPingRequest {
                            src: self_ref.clone(),
                            ring_level: level,
                        },
                    )
                    .into(),
                },
            });
            break;
        }

        if !includes_pid(&sub_range, nh.partition_id) {
            continue;
        }

        let Ok(classification) = nh.cpe.which_side_space(space_part, true) else {
            continue;
        };

        if classification.here || goes_forward(direction, classification.left, classification.right) {
            let new_limit = sub_range.restrict(direction.opposite(), nh.partition_id);
            steps.push(RoutingStep::Deliver {
                to: nh.clone(),
                envelope: Envelope::RouteByCpe {
                    space_part: space_part.clone(),
                    limit: new_limit,
                    forking,
                    ttl,
                    payload: payload.clone(),
                },
            });
            sub_range = sub_range.restrict(direction, nh.partition_id);
            if !goes_backward(direction, classification.left, classification.right) {
                break;
            }
        }
    }
}
