//! By-numeric routing: a single walk around increasingly fine-grained
//! rings towards a target `NumericID` (§4.6).

use skiptree_core::{Direction, NodeRef, NumericID};
use skiptree_neighbourhood::Neighbourhood;

use crate::envelope::ByNumericState;

/// What the local peer should do with a by-numeric envelope it just
/// received.
#[derive(Debug, Clone)]
pub enum ByNumericOutcome {
    /// `dest` matches this peer, or the envelope was marked final.
    DeliverLocal,
    /// The ring has been fully traversed back to `start`; deliver to the
    /// best candidate seen along the way.
    DeliverTo(NodeRef),
    /// Forward to the next hop, carrying updated walk state.
    Forward(NodeRef, ByNumericState),
}

/// Linear distance between two numeric ids along the identifier line. The
/// source algorithm does not specify ring-wrap distance for this
/// comparison, so this mirrors the simpler of the two readings.
#[must_use]
fn numeric_distance(a: NumericID, b: NumericID) -> u128 {
    a.bits().abs_diff(b.bits())
}

/// Advance a by-numeric walk by one hop, from `self_ref`'s point of view.
#[must_use]
pub fn step_by_numeric(
    self_ref: &NodeRef,
    neighbourhood: &Neighbourhood,
    mut state: ByNumericState,
) -> ByNumericOutcome {
    if state.dest == self_ref.numeric_id || state.is_final {
        return ByNumericOutcome::DeliverLocal;
    }

    if state.start.name_id == self_ref.name_id {
        return ByNumericOutcome::DeliverTo(state.best);
    }

    let lcp = state.dest.longest_prefix_length(self_ref.numeric_id);
    if lcp > state.ring_level as u32 {
        state.ring_level = lcp as usize;
        state.start = self_ref.clone();
        state.best = self_ref.clone();
    } else if numeric_distance(state.dest, self_ref.numeric_id)
        < numeric_distance(state.dest, state.best.numeric_id)
    {
        state.best = self_ref.clone();
    }

    let next = neighbourhood.get_neighbour(Direction::Right, state.ring_level, self_ref);
    ByNumericOutcome::Forward(next, state)
}
