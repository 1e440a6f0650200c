//! Failures raised while framing or unframing a netstring on the wire.

use std::fmt;

/// Recoverable conditions the framing layer itself distinguishes (§6, §7):
/// a malformed length prefix or delimiter, or a frame that exceeds the
/// configured cap. Both are handled by closing the connection rather than
/// propagated further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum WireError {
    /// The length prefix was not ASCII digits, or the `;`/`,` delimiters
    /// were not where expected.
    Malformed,
    /// The declared frame length exceeds `NodeConfig::max_frame_bytes`.
    FrameTooLarge { declared: usize, max: usize },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed netstring frame"),
            Self::FrameTooLarge { declared, max } => {
                write!(f, "frame of {declared} bytes exceeds the {max} byte cap")
            }
        }
    }
}

impl std::error::Error for WireError {}
