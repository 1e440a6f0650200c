//! Netstring framing: `len;payload,` where `len` is ASCII digits and the
//! payload is an opaque byte string (§6). Graceful close is a zero-byte
//! read at a frame boundary.

use std::io::{self, BufRead, Read, Write};

use crate::error::WireError;

/// Read one netstring frame from `r`, enforcing `max_len`.
///
/// Returns `Ok(None)` if the stream closed cleanly at a frame boundary
/// (zero bytes available before the length prefix even starts).
///
/// # Errors
/// Returns [`WireError::Malformed`] if the length prefix or either
/// delimiter is not where expected, or [`WireError::FrameTooLarge`] if the
/// declared length exceeds `max_len`. I/O failures are reported as-is.
pub fn read_frame<R: BufRead>(r: &mut R, max_len: usize) -> anyhow::Result<Option<Vec<u8>>> {
    let mut len_buf = Vec::new();
    let n = r.read_until(b';', &mut len_buf)?;
    if n == 0 {
        return Ok(None);
    }
    if len_buf.last() != Some(&b';') {
        return Err(WireError::Malformed.into());
    }
    len_buf.pop();

    if len_buf.is_empty() || !len_buf.iter().all(u8::is_ascii_digit) {
        return Err(WireError::Malformed.into());
    }
    let declared: usize = std::str::from_utf8(&len_buf)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(WireError::Malformed)?;
    if declared > max_len {
        return Err(WireError::FrameTooLarge {
            declared,
            max: max_len,
        }
        .into());
    }

    let mut payload = vec![0u8; declared];
    r.read_exact(&mut payload)?;

    let mut trailer = [0u8; 1];
    r.read_exact(&mut trailer)?;
    if trailer[0] != b',' {
        return Err(WireError::Malformed.into());
    }

    Ok(Some(payload))
}

/// Write one netstring frame to `w`.
///
/// # Errors
/// Propagates any I/O failure from the underlying writer.
pub fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> io::Result<()> {
    write!(w, "{};", payload.len())?;
    w.write_all(payload)?;
    w.write_all(b",")?;
    Ok(())
}
