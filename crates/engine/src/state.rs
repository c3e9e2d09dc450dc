//! The compiled state table.
//!
//! A [`StateTable`] is built once from a [`Registry`] and is immutable for
//! the life of every engine sharing it. Registration order defines a linear
//! recognition chain: the start state, then one state per pattern, with each
//! state's single outgoing transition guarded by the next pattern. Custom
//! grammars extend the chain the same way.
//!
//! Validator callbacks attached to transitions are a closed enum,
//! [`TransitionValidator`], interpreted by the engine. Keeping the variants
//! closed (rather than accepting arbitrary function pointers) keeps the
//! engine statically analyzable and its cost bound provable.

use serde::{Deserialize, Serialize};

use registry::{PatternKind, Registry, RegistryError, OBI_MAX_TRANSITIONS, START_STATE_NAME};

/// Sentinel id for the implicit rejection sink.
pub const REJECTED_STATE: u16 = u16::MAX;

/// Closed set of validation behaviors a transition may carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TransitionValidator {
    /// No validation beyond the pattern match.
    None,
    /// Zero-width: the version shape must appear inside the previous lexeme.
    VersionShape,
    /// The matched token must be the `sec:` prefix plus 64 lowercase hex.
    TokenHex,
    /// The match is bounded by the length declared in the framing lexeme.
    DeclaredLength,
}

impl TransitionValidator {
    fn for_kind(kind: PatternKind) -> Self {
        match kind {
            PatternKind::VersionParse => TransitionValidator::VersionShape,
            PatternKind::SecurityToken => TransitionValidator::TokenHex,
            PatternKind::DataPayload => TransitionValidator::DeclaredLength,
            _ => TransitionValidator::None,
        }
    }
}

/// Edge from one state to another, guarded by a pattern.
#[derive(Debug, Clone)]
pub struct Transition {
    pub from: u16,
    pub to: u16,
    /// Index into the registry's pattern slice.
    pub pattern: u16,
    pub validator: TransitionValidator,
    /// Zero-width transitions validate the previous lexeme and consume
    /// nothing from the canonical stream.
    pub zero_width: bool,
    pub cost_weight: f64,
}

/// One node of the recognizer.
#[derive(Debug, Clone)]
pub struct DfaState {
    pub id: u16,
    pub name: String,
    /// Index of the pattern whose match leads into this state; the start
    /// state has none.
    pub pattern: Option<u16>,
    pub is_initial: bool,
    pub is_accepting: bool,
    /// Indices into the table's transition slice, in priority order.
    pub transitions: Vec<usize>,
}

/// The fixed recognizer graph: states plus the transition matrix.
#[derive(Debug, Clone)]
pub struct StateTable {
    states: Vec<DfaState>,
    transitions: Vec<Transition>,
}

impl StateTable {
    /// Build the linear recognition chain over `registry`.
    ///
    /// Fails with [`RegistryError::TransitionsExhausted`] when the chain
    /// would exceed the transition bound; the registry itself already
    /// bounds the state count.
    pub fn build(registry: &Registry) -> Result<Self, RegistryError> {
        let patterns = registry.patterns();
        if patterns.len() > OBI_MAX_TRANSITIONS {
            return Err(RegistryError::TransitionsExhausted {
                limit: OBI_MAX_TRANSITIONS,
            });
        }

        let mut states = Vec::with_capacity(patterns.len() + 1);
        states.push(DfaState {
            id: 0,
            name: START_STATE_NAME.to_owned(),
            pattern: None,
            is_initial: true,
            is_accepting: false,
            transitions: Vec::new(),
        });

        let mut transitions = Vec::with_capacity(patterns.len());
        for (idx, pattern) in patterns.iter().enumerate() {
            let from = idx as u16;
            let to = pattern.id;
            transitions.push(Transition {
                from,
                to,
                pattern: idx as u16,
                validator: TransitionValidator::for_kind(pattern.kind),
                zero_width: pattern.kind.is_zero_width(),
                cost_weight: pattern.cost_weight,
            });
            states[idx].transitions.push(idx);
            states.push(DfaState {
                id: to,
                name: pattern.state_name.clone(),
                pattern: Some(idx as u16),
                is_initial: false,
                is_accepting: pattern.is_accepting,
                transitions: Vec::new(),
            });
        }

        Ok(Self {
            states,
            transitions,
        })
    }

    /// States in id order.
    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    /// The transition matrix.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// State by id; `None` for the rejection sink or out-of-range ids.
    pub fn state(&self, id: u16) -> Option<&DfaState> {
        self.states.get(id as usize)
    }

    /// Number of states, start state included.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Number of transitions.
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_chain_is_linear_and_reachable_in_order() {
        let registry = Registry::with_builtins().unwrap();
        let table = StateTable::build(&registry).unwrap();

        assert_eq!(table.state_count(), 8);
        assert_eq!(table.transition_count(), 7);

        // Each state k < 7 has exactly one outgoing edge, to k + 1; the
        // terminal state has none. This is the reachability chain: S7 only
        // through S6, S6 only through S5, and so on back to S0.
        for state in table.states() {
            if state.id < 7 {
                assert_eq!(state.transitions.len(), 1);
                let t = &table.transitions()[state.transitions[0]];
                assert_eq!(t.from, state.id);
                assert_eq!(t.to, state.id + 1);
            } else {
                assert!(state.transitions.is_empty());
            }
        }

        assert!(table.state(0).unwrap().is_initial);
        let accepting: Vec<u16> = table
            .states()
            .iter()
            .filter(|s| s.is_accepting)
            .map(|s| s.id)
            .collect();
        assert_eq!(accepting, vec![6, 7]);
    }

    #[test]
    fn builtin_state_names_follow_the_protocol_chain() {
        let registry = Registry::with_builtins().unwrap();
        let table = StateTable::build(&registry).unwrap();
        let names: Vec<&str> = table.states().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "PROTOCOL_START",
                "VERSION_PARSING",
                "SECURITY_TOKEN_EXPECTED",
                "TOKEN_VALIDATION",
                "SCHEMA_REFERENCE",
                "PAYLOAD_DELIMITER",
                "DATA_PAYLOAD",
                "AUDIT_MARKER",
            ]
        );
    }

    #[test]
    fn validators_attach_to_the_expected_edges() {
        let registry = Registry::with_builtins().unwrap();
        let table = StateTable::build(&registry).unwrap();
        let validators: Vec<TransitionValidator> =
            table.transitions().iter().map(|t| t.validator).collect();
        assert_eq!(
            validators,
            vec![
                TransitionValidator::None,
                TransitionValidator::VersionShape,
                TransitionValidator::TokenHex,
                TransitionValidator::None,
                TransitionValidator::None,
                TransitionValidator::DeclaredLength,
                TransitionValidator::None,
            ]
        );

        let zero_width: Vec<bool> = table.transitions().iter().map(|t| t.zero_width).collect();
        assert_eq!(
            zero_width,
            vec![false, true, false, false, false, false, false]
        );
    }
}
