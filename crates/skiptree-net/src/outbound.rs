//! Drains a dispatcher's outbound `(NodeRef, Envelope)` pairs through the
//! egress manager (§5): small frames are offloaded to a short-lived
//! thread, large frames (>64 KiB) are sent blocking on the calling
//! thread to avoid tracking a partial send across a detached thread.

use std::net::TcpStream;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use skiptree_core::NodeRef;
use skiptree_dispatch::{is_large_frame, EgressManager};
use skiptree_routing::Envelope;

use crate::codec::encode_envelope;
use crate::framing::write_frame;

/// Send every `(dest, envelope)` pair in `outbound` through `egress`.
/// Failures are reported on `fail_tx` as the destination's `NodeRef`, so
/// the ingress/dispatcher thread can call `Dispatcher::node_fail`.
pub fn deliver(
    egress: &Arc<EgressManager<TcpStream>>,
    outbound: Vec<(NodeRef, Envelope)>,
    fail_tx: &Sender<NodeRef>,
) {
    for (dest, envelope) in outbound {
        let frame = match build_frame(&envelope) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode outbound envelope");
                continue;
            }
        };

        if is_large_frame(frame.len()) {
            send_one(egress, dest, &frame, fail_tx);
        } else {
            let egress = Arc::clone(egress);
            let fail_tx = fail_tx.clone();
            std::thread::spawn(move || send_one(&egress, dest, &frame, &fail_tx));
        }
    }
}

fn build_frame(envelope: &Envelope) -> anyhow::Result<Vec<u8>> {
    let payload = encode_envelope(envelope)?;
    let mut frame = Vec::with_capacity(payload.len() + 16);
    write_frame(&mut frame, &payload)?;
    Ok(frame)
}

fn send_one(egress: &EgressManager<TcpStream>, dest: NodeRef, frame: &[u8], fail_tx: &Sender<NodeRef>) {
    if let Err(e) = egress.send(dest.address, frame) {
        tracing::warn!(peer = %dest, error = %e, "egress send failed");
        let _ = fail_tx.send(dest);
    }
}
