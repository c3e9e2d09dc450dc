//! Origin hashing for canonical buffers.
//!
//! The origin hash binds a canonical buffer to the exact raw bytes it was
//! derived from, under a specific normalization version:
//!
//! ```text
//! SHA-256(version.to_be_bytes() || 0x00 || raw_input_bytes)
//! ```
//!
//! Including the version means two normalizer releases that would fold the
//! same raw input differently can never be confused with one another in an
//! audit trail.

use sha2::{Digest, Sha256};

/// Compute the version-aware origin hash of a raw input.
///
/// Returns a 64-character hex digest. Deterministic across platforms.
pub fn hash_origin_bytes(version: u32, raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(version.to_be_bytes());
    hasher.update([0]);
    hasher.update(raw);
    hex::encode(hasher.finalize())
}
