//! Direct routing: the envelope already names its destination.

use skiptree_core::NodeRef;

use crate::envelope::Envelope;
use crate::payload::Payload;

/// `route_direct` is trivial by construction: the single hop is the
/// destination carried by the envelope.
#[must_use]
pub fn route_direct(dest: NodeRef, payload: Payload) -> Vec<(NodeRef, Envelope)> {
    vec![(
        dest.clone(),
        Envelope::RouteDirect { dest, payload },
    )]
}
