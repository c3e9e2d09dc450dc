//! Error types produced by the `registry` crate.
//!
//! All variants are init-time failures: a registration that errors leaves
//! the registry unchanged, and an engine is never constructed over a
//! partially registered grammar.

use thiserror::Error;

/// Errors that can occur while registering patterns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    /// The bounded state table is full.
    #[error("pattern registry is full: at most {limit} states")]
    Full { limit: usize },

    /// The regex source exceeds the pattern length bound.
    #[error("pattern source is {len} bytes, limit is {limit}")]
    PatternTooLong { len: usize, limit: usize },

    /// The regex source failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Building the transition table would exceed the transition bound.
    #[error("transition table is full: at most {limit} transitions")]
    TransitionsExhausted { limit: usize },
}
