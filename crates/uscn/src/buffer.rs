//! The canonical buffer type.
//!
//! A [`CanonicalBuffer`] is the bounded output of normalization: the only
//! form of input the recognizer ever inspects. It owns its bytes; recognizer
//! output copies lexemes out of it, so the buffer can be released as soon as
//! an admission returns.

use serde::{Deserialize, Serialize};

/// Bounded byte sequence resulting from canonical normalization.
///
/// For a fixed [`UscnConfig`](crate::UscnConfig) and raw input, every field
/// is deterministic: same bytes, same origin hash, on any machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalBuffer {
    /// Canonical bytes after substitution, case folding, and whitespace
    /// folding. Length is bounded by
    /// [`OBI_CANONICAL_BUFFER_SIZE`](crate::OBI_CANONICAL_BUFFER_SIZE).
    pub bytes: Vec<u8>,

    /// Version-aware SHA-256 hex digest of the raw input this buffer was
    /// derived from. Links canonical data back to its origin for audits.
    pub origin_hash: String,

    /// Normalization version that produced this buffer.
    pub version: u32,
}

impl CanonicalBuffer {
    /// Canonical length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the canonical stream is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, returning the owned canonical bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
