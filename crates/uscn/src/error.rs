//! Error types produced by the `uscn` crate.
//!
//! The primary error surface is [`UscnError`], used for all normalization
//! failures. Errors are typed, cloneable, and comparable so callers can
//! branch on them precisely and tests can assert exact variants.

use thiserror::Error;

/// Errors that can occur during canonical normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UscnError {
    /// The configuration is unusable (currently: `version == 0`).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Substitution would push the canonical stream past the buffer bound.
    /// No partial result is produced.
    #[error("canonical output would exceed {limit} bytes")]
    BufferOverflow { limit: usize },

    /// Strict UTF-8 checking is on and the canonical stream is not valid
    /// UTF-8 starting at `position`.
    #[error("canonical stream is not valid utf-8 at byte {position}")]
    InvalidUtf8 { position: usize },
}
