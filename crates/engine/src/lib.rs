//! DFA admission engine over canonical input.
//!
//! This crate is the recognition stage of the protocol admission pipeline:
//! it builds a fixed state table from a pattern registry, consumes canonical
//! bytes produced by the `uscn` crate, emits a typed IR stream, and gates
//! every admission with Sinphase governance-cost accounting.
//!
//! ```text
//! Raw Bytes ──▶ USCN ──▶ DFA Recognizer ──▶ IR + Cost ──▶ Admission Decision
//!                              ↑
//!                         (this crate)
//! ```
//!
//! The entry point is [`Engine::admit`]: normalize, recognize, account, and
//! return either an [`Admission`] (IR stream, total cost, governance zone,
//! final state) or a structured [`Rejection`] (kind, byte position, cost,
//! partial IR). An engine also serializes its own recognizer as a
//! language-neutral YAML or JSON document via [`Engine::export_spec`].
//!
//! # Example
//!
//! ```rust
//! use engine::{Engine, EngineConfig, IrKind};
//!
//! let mut engine = Engine::with_builtins(EngineConfig::default()).unwrap();
//! let message = format!(
//!     "OBI-PROTOCOL-1.0:SEC:{}SCHEMA:msg.1PAYLOAD|5|helloAUDIT:1700000000000",
//!     "A".repeat(64)
//! );
//! let admission = engine.admit(message.as_bytes()).unwrap();
//! assert_eq!(admission.ir.kinds()[0], IrKind::ProtocolMessage);
//! assert!(admission.cost <= 0.5);
//! ```

mod admit;
mod error;
mod export;
mod governance;
mod ir;
mod state;

pub use crate::admit::{Admission, Engine, EngineConfig};
pub use crate::error::{ExportError, Rejection, RejectionKind};
pub use crate::export::{
    spec_document, GovernanceSpec, SpecDocument, SpecFormat, StateSpec, TransitionSpec,
    UscnMappingSpec, PROTOCOL_VERSION, SPEC_SCHEMA_VERSION,
};
pub use crate::governance::{
    transition_cost, CostAccumulator, GovernanceZone, COST_THRESHOLD, WARNING_THRESHOLD,
};
pub use crate::ir::{IrKind, IrNode, IrStream};
pub use crate::state::{DfaState, StateTable, Transition, TransitionValidator, REJECTED_STATE};
