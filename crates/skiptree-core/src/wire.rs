//! CBOR encode/decode helpers shared by every envelope and payload type.
//!
//! Payload-level encoding must be self-describing and round-trip node and
//! envelope structures (§6); `ciborium` gives us that for free over `serde`
//! derives, the same way `sezkp-core::io` uses it for `ProofArtifact`.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Serialize any `T: Serialize` to CBOR bytes.
///
/// # Errors
/// Returns an error if CBOR encoding fails (e.g. a type with a
/// non-serializable field, which would be a bug rather than a runtime
/// condition).
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).context("encode CBOR payload")?;
    Ok(buf)
}

/// Deserialize `T` from CBOR bytes.
///
/// # Errors
/// Returns an error if the bytes are not valid CBOR or do not match `T`'s
/// shape.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).context("decode CBOR payload")
}

/// Tiny versioned wrapper so the wire format can evolve: a `u16` tag paired
/// with a payload, decoded eagerly so callers can reject an unexpected wire
/// version before trying to interpret the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub ver: u16,
    pub payload: T,
}

impl<T> Versioned<T> {
    #[must_use]
    pub fn new(ver: u16, payload: T) -> Self {
        Self { ver, payload }
    }
}

/// Current wire protocol version for envelopes.
pub const WIRE_VERSION: u16 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cbor_roundtrip() {
        let v = Versioned::new(WIRE_VERSION, vec![1u32, 2, 3]);
        let bytes = to_cbor(&v).unwrap();
        let back: Versioned<Vec<u32>> = from_cbor(&bytes).unwrap();
        assert_eq!(back.ver, v.ver);
        assert_eq!(back.payload, v.payload);
    }
}
