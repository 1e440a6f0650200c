//! Network listener thread (§5): accepts connections and forwards framed,
//! decoded envelopes onto the ingress channel. One reader thread per
//! connection, since netstring framing is stateful per stream and
//! ordering within one (source, destination) stream must be preserved.

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::Sender;

use skiptree_routing::Envelope;

use crate::codec::decode_envelope;
use crate::framing::read_frame;

/// Accept connections on `listener` forever, spawning one reader thread
/// per accepted connection. Each decoded envelope is sent to `ingress`;
/// the loop for a connection ends on graceful close, a framing error, or
/// a send failure.
pub fn run(listener: TcpListener, max_frame_bytes: usize, ingress: Sender<Envelope>) {
    for incoming in listener.incoming() {
        match incoming {
            Ok(stream) => {
                let ingress = ingress.clone();
                std::thread::spawn(move || handle_connection(stream, max_frame_bytes, &ingress));
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to accept connection");
            }
        }
    }
}

fn handle_connection(stream: TcpStream, max_frame_bytes: usize, ingress: &Sender<Envelope>) {
    let peer = stream.peer_addr().ok();
    let mut reader = BufReader::new(stream);
    loop {
        match read_frame(&mut reader, max_frame_bytes) {
            Ok(None) => {
                tracing::debug!(?peer, "connection closed gracefully");
                return;
            }
            Ok(Some(bytes)) => match decode_envelope(&bytes) {
                Ok(envelope) => {
                    if ingress.send(envelope).is_err() {
                        tracing::warn!("ingress channel closed; dropping connection");
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(?peer, error = %e, "dropping malformed envelope");
                }
            },
            Err(e) => {
                tracing::warn!(?peer, error = %e, "framing error; closing connection");
                return;
            }
        }
    }
}
