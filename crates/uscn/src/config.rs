//! Configuration for the canonicalization pipeline.
//!
//! [`UscnConfig`] controls which folding phases run and whether the canonical
//! stream must be valid UTF-8. The `version` field tracks behavioral changes:
//! any change to normalization output, including bug fixes, must bump it so
//! that origin hashes from different versions never collide silently.

use serde::{Deserialize, Serialize};

/// Configuration for canonical normalization.
///
/// Cheap to clone, serde round-trippable, and stable for a given `version`
/// across machines, platforms, and locales.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UscnConfig {
    /// Semantic version of the normalization behavior. Must be >= 1;
    /// version 0 is reserved and rejected. Participates in the origin hash.
    pub version: u32,

    /// Lowercase ASCII letters after substitution. Non-ASCII bytes are
    /// preserved verbatim either way. Default on.
    pub fold_case: bool,

    /// Collapse each maximal run of space, tab, CR, and LF into a single
    /// space. Leading and trailing whitespace is collapsed, never trimmed.
    /// Default on.
    pub fold_whitespace: bool,

    /// Require the canonical stream to be valid UTF-8 and fail with
    /// [`UscnError::InvalidUtf8`](crate::UscnError::InvalidUtf8) otherwise.
    /// Default off for compatibility with binary payload segments.
    pub strict_utf8: bool,
}

impl Default for UscnConfig {
    fn default() -> Self {
        Self {
            version: 1,
            fold_case: true,
            fold_whitespace: true,
            strict_utf8: false,
        }
    }
}
