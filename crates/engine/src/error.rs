//! Rejection and export error types.
//!
//! A rejection is structured data, not control flow: kind, byte position,
//! accumulated cost, and whatever partial IR was emitted before the failure.
//! There is no exception-like path across the public API.

use thiserror::Error;

use uscn::UscnError;

use crate::ir::IrStream;

/// Why an admission was refused.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RejectionKind {
    /// An empty buffer was provided to admission.
    #[error("input buffer is empty")]
    InvalidInput,

    /// Normalization would exceed the canonical buffer bound.
    #[error("canonical output would exceed {limit} bytes")]
    BufferOverflow { limit: usize },

    /// A raw-input path reached a recognizer that demands canonical input.
    #[error("raw input reached a zero-trust recognizer without normalization")]
    Unnormalized,

    /// No outgoing transition matched at the reported position.
    #[error("no transition matched")]
    NoMatch,

    /// Accumulated governance cost crossed the rejection threshold.
    #[error("governance budget exhausted at cost {cost:.3}")]
    BudgetExceeded { cost: f64 },

    /// Strict UTF-8 checking failed inside the canonical stream.
    #[error("canonical stream is not valid utf-8")]
    InvalidUtf8,
}

/// A refused admission.
///
/// Position is the byte offset into the canonical stream where recognition
/// stopped; `partial` holds every node emitted before the failure, possibly
/// capped by an [`ErrorCondition`](crate::IrKind::ErrorCondition) marker.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("admission rejected at byte {position}: {kind}")]
pub struct Rejection {
    pub kind: RejectionKind,
    pub position: usize,
    /// Cost accumulated up to and including the refusing step.
    pub cost: f64,
    pub partial: IrStream,
}

impl Rejection {
    pub(crate) fn from_normalize(err: UscnError) -> Self {
        let (kind, position) = match err {
            UscnError::BufferOverflow { limit } => (RejectionKind::BufferOverflow { limit }, 0),
            UscnError::InvalidUtf8 { position } => (RejectionKind::InvalidUtf8, position),
            // Config problems surface as unusable input at the admission
            // boundary; the taxonomy has no construction-time variant here.
            _ => (RejectionKind::InvalidInput, 0),
        };
        Self {
            kind,
            position,
            cost: 0.0,
            partial: IrStream::new(),
        }
    }
}

/// Errors from the spec exporter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExportError {
    /// The requested format is not supported.
    #[error("unsupported spec format: {0}")]
    UnsupportedFormat(String),

    /// Serialization failed.
    #[error("spec serialization failed: {0}")]
    Serialize(String),
}
