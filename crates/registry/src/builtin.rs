//! The built-in protocol grammar.
//!
//! Registration order is the recognition order: each row's match leads the
//! recognizer into the named state, and the linear chain of states built from
//! this table is the layered protocol grammar. Regex sources are written for
//! lowercase canonical input; the normalizer guarantees the stream is already
//! folded before any of these run.

use crate::pattern::PatternKind;

/// One built-in pattern row: kind, regex source, and the name of the state
/// its match enters.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinPattern {
    pub kind: PatternKind,
    pub source: &'static str,
    pub state_name: &'static str,
}

/// Mandatory patterns, in recognition order.
pub static BUILTIN_PATTERNS: &[BuiltinPattern] = &[
    BuiltinPattern {
        kind: PatternKind::ProtocolHeader,
        source: r"obi-protocol-[0-9]+\.[0-9]+:",
        state_name: "VERSION_PARSING",
    },
    BuiltinPattern {
        kind: PatternKind::VersionParse,
        source: r"[0-9]+\.[0-9]+",
        state_name: "SECURITY_TOKEN_EXPECTED",
    },
    BuiltinPattern {
        kind: PatternKind::SecurityToken,
        source: r"sec:[a-f0-9]{64}",
        state_name: "TOKEN_VALIDATION",
    },
    BuiltinPattern {
        kind: PatternKind::SchemaReference,
        source: r"schema:[a-z0-9_-]+\.[0-9]+",
        state_name: "SCHEMA_REFERENCE",
    },
    BuiltinPattern {
        kind: PatternKind::PayloadDelimiter,
        source: r"payload\|[0-9]+\|",
        state_name: "PAYLOAD_DELIMITER",
    },
    BuiltinPattern {
        kind: PatternKind::DataPayload,
        source: r".*",
        state_name: "DATA_PAYLOAD",
    },
    BuiltinPattern {
        kind: PatternKind::AuditMarker,
        source: r"audit:[0-9]{13}",
        state_name: "AUDIT_MARKER",
    },
];

/// Name of the initial state, which no pattern leads into.
pub const START_STATE_NAME: &str = "PROTOCOL_START";
