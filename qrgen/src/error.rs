//! Errors this crate's public API can return. Hand-rolled rather than
//! built on `thiserror`, matching the layout engine's [`armlayout::Fatal`]
//! style -- a small closed enum is clearer here than a derive macro would
//! be for four variants.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrError {
    /// `version` was outside `1..=40`.
    InvalidVersion(u8),
    /// The requested content doesn't fit this mode's character set.
    InvalidContent(&'static str),
    /// The encoded content's bit length exceeds this version/level's data
    /// capacity.
    CapacityExceeded { need: u32, have: u32 },
    /// More than one `Bytes`/`Alpha`/`Num` segment referenced the same
    /// byte range of module grid (an internal invariant violation, should
    /// never surface from the public API).
    PlanConflict(&'static str),
}

impl fmt::Display for QrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QrError::InvalidVersion(v) => write!(f, "invalid QR version {} (must be 1-40)", v),
            QrError::InvalidContent(msg) => write!(f, "invalid content: {}", msg),
            QrError::CapacityExceeded { need, have } => write!(
                f,
                "content needs {} bits but this version/level only has {} available",
                need, have
            ),
            QrError::PlanConflict(msg) => write!(f, "internal plan conflict: {}", msg),
        }
    }
}

impl std::error::Error for QrError {}
