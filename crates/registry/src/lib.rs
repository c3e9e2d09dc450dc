//! Pattern registry for the protocol admission engine.
//!
//! The registry holds the set of named semantic patterns the recognizer is
//! built from: protocol header, security token, schema reference, payload
//! framing, payload body, and audit marker, plus extension kinds for custom
//! grammars. Each pattern carries its compiled recognizer, acceptance and
//! zero-trust flags, and its governance cost weight.
//!
//! # Compile once
//!
//! Regular expressions compile at registration time and never again; the
//! compiled automata are owned by the [`Pattern`] and reused for every
//! admission. This is load-bearing for the engine's bounded-cost guarantee.
//!
//! # Bounds
//!
//! The registry holds at most [`OBI_MAX_STATES`] states (the start state
//! plus one per pattern) and sources of at most [`OBI_MAX_PATTERN_LENGTH`]
//! bytes; registration past either bound fails with a typed error and the
//! registry is left unchanged. The transition bound
//! [`OBI_MAX_TRANSITIONS`] is enforced when a state table is built.
//!
//! # Example
//!
//! ```rust
//! use registry::{PatternKind, Registry};
//!
//! let mut registry = Registry::with_builtins().unwrap();
//! let state = registry
//!     .register(PatternKind::CanonicalDelimiter, r";")
//!     .unwrap();
//! assert_eq!(state as usize, registry.len());
//! ```

mod builtin;
mod error;
mod pattern;
mod registry;

pub use crate::builtin::{BuiltinPattern, BUILTIN_PATTERNS, START_STATE_NAME};
pub use crate::error::RegistryError;
pub use crate::pattern::{Pattern, PatternKind};
pub use crate::registry::Registry;

/// Hard bound on recognizer states, start state included.
pub const OBI_MAX_STATES: usize = 256;

/// Hard bound on transitions in a built state table.
pub const OBI_MAX_TRANSITIONS: usize = 1024;

/// Hard bound on a registered regex source, in bytes.
pub const OBI_MAX_PATTERN_LENGTH: usize = 512;
