//! Encodes/decodes an [`Envelope`] as the netstring payload (§6): a CBOR
//! `Versioned<Envelope>`, rejecting any wire version this build does not
//! understand.

use anyhow::{bail, Context, Result};
use skiptree_core::wire::{from_cbor, to_cbor, Versioned, WIRE_VERSION};
use skiptree_routing::Envelope;

/// Encode `envelope` as a CBOR-wrapped, versioned payload ready to frame.
///
/// # Errors
/// Returns an error if CBOR encoding fails.
pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>> {
    to_cbor(&Versioned::new(WIRE_VERSION, envelope)).context("encode envelope")
}

/// Decode a netstring payload back into an [`Envelope`].
///
/// # Errors
/// Returns an error if the bytes are not valid CBOR, or if they declare a
/// wire version this build does not understand.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope> {
    let versioned: Versioned<Envelope> = from_cbor(bytes).context("decode envelope")?;
    if versioned.ver != WIRE_VERSION {
        bail!(
            "unsupported wire version {} (expected {WIRE_VERSION})",
            versioned.ver
        );
    }
    Ok(versioned.payload)
}
