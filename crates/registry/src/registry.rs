//! The bounded, append-only pattern registry.
//!
//! A [`Registry`] owns the compiled patterns an engine recognizes with. It
//! is mutable only before engine construction; once a state table is built
//! over it the registry is shared immutably (typically behind an `Arc`)
//! across every engine instance that speaks the same grammar.

use crate::builtin::BUILTIN_PATTERNS;
use crate::error::RegistryError;
use crate::pattern::{Pattern, PatternKind};
use crate::{OBI_MAX_PATTERN_LENGTH, OBI_MAX_STATES};

/// The set of registered patterns, in priority (registration) order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    patterns: Vec<Pattern>,
}

impl Registry {
    /// An empty registry. Engines over an empty registry reject everything,
    /// so most callers want [`Registry::with_builtins`].
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the mandatory protocol grammar.
    pub fn with_builtins() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for builtin in BUILTIN_PATTERNS {
            registry.register_named(
                builtin.kind,
                builtin.source,
                builtin.state_name.to_owned(),
                builtin.kind.default_cost_weight(),
            )?;
        }
        Ok(registry)
    }

    /// Append one pattern, returning the state id its match leads into.
    ///
    /// The regex compiles here, once; constraints are the pattern length
    /// bound and the state table bound. State id 0 is the start state, so
    /// the first registered pattern receives id 1.
    pub fn register(&mut self, kind: PatternKind, source: &str) -> Result<u16, RegistryError> {
        let id = self.next_id()?;
        let state_name = format!("{}_{id}", kind.as_str().to_ascii_uppercase());
        self.register_checked(id, kind, source, state_name, kind.default_cost_weight())
    }

    /// Append one pattern with an explicit cost weight.
    pub fn register_weighted(
        &mut self,
        kind: PatternKind,
        source: &str,
        cost_weight: f64,
    ) -> Result<u16, RegistryError> {
        let id = self.next_id()?;
        let state_name = format!("{}_{id}", kind.as_str().to_ascii_uppercase());
        self.register_checked(id, kind, source, state_name, cost_weight)
    }

    fn register_named(
        &mut self,
        kind: PatternKind,
        source: &str,
        state_name: String,
        cost_weight: f64,
    ) -> Result<u16, RegistryError> {
        let id = self.next_id()?;
        self.register_checked(id, kind, source, state_name, cost_weight)
    }

    /// Shared tail of every registration path. `id` comes from the caller's
    /// single `next_id` bounds check and is the id the pattern is compiled
    /// under.
    fn register_checked(
        &mut self,
        id: u16,
        kind: PatternKind,
        source: &str,
        state_name: String,
        cost_weight: f64,
    ) -> Result<u16, RegistryError> {
        if source.len() > OBI_MAX_PATTERN_LENGTH {
            return Err(RegistryError::PatternTooLong {
                len: source.len(),
                limit: OBI_MAX_PATTERN_LENGTH,
            });
        }
        let pattern = Pattern::compile(id, kind, source, state_name, cost_weight)?;
        self.patterns.push(pattern);
        Ok(id)
    }

    fn next_id(&self) -> Result<u16, RegistryError> {
        // Start state plus one state per pattern must fit the table bound.
        if self.patterns.len() + 1 >= OBI_MAX_STATES {
            return Err(RegistryError::Full {
                limit: OBI_MAX_STATES,
            });
        }
        Ok(self.patterns.len() as u16 + 1)
    }

    /// Registered patterns in priority order.
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Pattern whose match leads into `state_id`, if any.
    pub fn pattern_for_state(&self, state_id: u16) -> Option<&Pattern> {
        state_id
            .checked_sub(1)
            .and_then(|idx| self.patterns.get(idx as usize))
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when no pattern has been registered.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of states a table built over this registry will have,
    /// including the start state.
    pub fn state_count(&self) -> usize {
        self.patterns.len() + 1
    }
}
