//! Pattern kinds and the compiled pattern type.
//!
//! A [`Pattern`] is a named recognizer for one semantic role in the layered
//! protocol grammar. Its regular expression is compiled exactly once, at
//! registration time, into two forms: an anchored automaton used for
//! prefix matching during recognition, and a floating automaton used by
//! zero-width validators that re-check a sub-lexeme of an earlier match.
//! Recompiling per input position would void the bounded-cost guarantee, so
//! no other compilation site exists.

use regex::bytes::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Semantic role a pattern recognizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PatternKind {
    /// The leading `obi-protocol-<major>.<minor>:` header.
    ProtocolHeader,
    /// The `<major>.<minor>` version sub-lexeme; validated zero-width
    /// against the header match rather than consumed from the stream.
    VersionParse,
    /// The `sec:` token with 64 canonical hex digits.
    SecurityToken,
    /// A `schema:<name>.<version>` reference.
    SchemaReference,
    /// The `payload|<len>|` framing delimiter; declares the payload bound.
    PayloadDelimiter,
    /// The payload body. Accepting.
    DataPayload,
    /// The trailing `audit:<millis>` marker. Accepting.
    AuditMarker,
    /// Zero-width structural boundary between recognition phases.
    TransitionBoundary,
    /// A canonical structural delimiter in extension grammars.
    CanonicalDelimiter,
    /// Recovery pattern used to mark unrecognized regions.
    ErrorRecovery,
}

impl PatternKind {
    /// Snake-case name used in serialized specs and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::ProtocolHeader => "protocol_header",
            PatternKind::VersionParse => "version_parse",
            PatternKind::SecurityToken => "security_token",
            PatternKind::SchemaReference => "schema_reference",
            PatternKind::PayloadDelimiter => "payload_delimiter",
            PatternKind::DataPayload => "data_payload",
            PatternKind::AuditMarker => "audit_marker",
            PatternKind::TransitionBoundary => "transition_boundary",
            PatternKind::CanonicalDelimiter => "canonical_delimiter",
            PatternKind::ErrorRecovery => "error_recovery",
        }
    }

    /// Accepting kinds terminate a message legally. Exactly the payload body
    /// and the audit marker accept; everything else is interior.
    pub fn is_accepting(self) -> bool {
        matches!(self, PatternKind::DataPayload | PatternKind::AuditMarker)
    }

    /// Kinds that must never see a raw-path input, even on an engine whose
    /// zero-trust flag is off.
    pub fn requires_zt(self) -> bool {
        matches!(self, PatternKind::SecurityToken | PatternKind::AuditMarker)
    }

    /// Zero-width kinds validate a sub-lexeme of the previous match and
    /// consume nothing from the canonical stream.
    pub fn is_zero_width(self) -> bool {
        matches!(
            self,
            PatternKind::VersionParse | PatternKind::TransitionBoundary
        )
    }

    /// Default governance cost charged when a transition guarded by this
    /// kind fires, before the per-byte match term.
    pub fn default_cost_weight(self) -> f64 {
        match self {
            PatternKind::ProtocolHeader => 0.02,
            PatternKind::VersionParse => 0.01,
            PatternKind::SecurityToken => 0.03,
            PatternKind::SchemaReference => 0.02,
            PatternKind::PayloadDelimiter => 0.01,
            PatternKind::DataPayload => 0.02,
            PatternKind::AuditMarker => 0.02,
            PatternKind::TransitionBoundary => 0.01,
            PatternKind::CanonicalDelimiter => 0.01,
            PatternKind::ErrorRecovery => 0.01,
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered recognizer for one semantic role.
///
/// Immutable after registration. The regex source is retained verbatim for
/// spec export; both compiled automata are reused across admissions.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// State id this pattern's match leads into (1-based; 0 is the start
    /// state, which recognizes nothing).
    pub id: u16,
    /// Semantic role.
    pub kind: PatternKind,
    /// Regex source as registered, evaluated over lowercase canonical bytes.
    pub source: String,
    /// Name of the state entered when this pattern matches.
    pub state_name: String,
    /// True when a message may legally terminate in this pattern's state.
    pub is_accepting: bool,
    /// True when recognition through this pattern demands canonical input.
    pub requires_zt: bool,
    /// Base governance cost per firing.
    pub cost_weight: f64,
    /// Registration order; earlier patterns win guard ties.
    pub priority: u16,
    anchored: Regex,
    floating: Regex,
}

impl Pattern {
    /// Compile a pattern. Both automata disable Unicode mode and enable
    /// dot-matches-newline so recognizers operate over raw canonical bytes.
    pub(crate) fn compile(
        id: u16,
        kind: PatternKind,
        source: &str,
        state_name: String,
        cost_weight: f64,
    ) -> Result<Self, RegistryError> {
        let anchored = Regex::new(&format!("^(?s-u:{source})"))
            .map_err(|err| RegistryError::InvalidPattern(err.to_string()))?;
        let floating = Regex::new(&format!("(?s-u:{source})"))
            .map_err(|err| RegistryError::InvalidPattern(err.to_string()))?;
        Ok(Self {
            id,
            kind,
            source: source.to_owned(),
            state_name,
            is_accepting: kind.is_accepting(),
            requires_zt: kind.requires_zt(),
            cost_weight,
            priority: id,
            anchored,
            floating,
        })
    }

    /// Length of the pattern's match at the head of `input`, if any.
    pub fn prefix_len(&self, input: &[u8]) -> Option<usize> {
        self.anchored.find(input).map(|m| m.end())
    }

    /// True when the pattern matches anywhere inside `lexeme`. Used by
    /// zero-width validators over a previously matched lexeme.
    pub fn matches_within(&self, lexeme: &[u8]) -> bool {
        self.floating.is_match(lexeme)
    }
}
