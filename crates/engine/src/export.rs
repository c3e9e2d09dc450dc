//! Serialized DFA specification export.
//!
//! An engine can describe itself as a language-neutral document so that
//! peers in other runtimes build a byte-identical recognizer. The document
//! carries the governance thresholds, the full substitution table, every
//! state with its pattern and flags, and the transition matrix.
//!
//! YAML and JSON are supported; the `c-header` format name is part of the
//! wire vocabulary but its emitter is not implemented, so requesting it
//! reports [`ExportError::UnsupportedFormat`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use uscn::ENCODING_RULES;

use crate::admit::Engine;
use crate::error::ExportError;
use crate::governance::{COST_THRESHOLD, WARNING_THRESHOLD};

/// Version of the admission protocol this engine speaks.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Bump whenever the exported document layout changes.
pub const SPEC_SCHEMA_VERSION: u32 = 1;

/// Output format for [`Engine::export_spec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SpecFormat {
    Yaml,
    Json,
    /// Recognized by name only; emission is unimplemented.
    CHeader,
}

impl SpecFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            SpecFormat::Yaml => "yaml",
            SpecFormat::Json => "json",
            SpecFormat::CHeader => "c-header",
        }
    }
}

impl FromStr for SpecFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yaml" => Ok(SpecFormat::Yaml),
            "json" => Ok(SpecFormat::Json),
            "c-header" => Ok(SpecFormat::CHeader),
            other => Err(ExportError::UnsupportedFormat(other.to_owned())),
        }
    }
}

impl std::fmt::Display for SpecFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Governance section of the exported document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GovernanceSpec {
    pub cost_threshold: f64,
    pub warning_threshold: f64,
}

/// One substitution rule in the exported document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UscnMappingSpec {
    pub encoded: String,
    pub canonical: String,
    pub security_risk: String,
}

/// One state in the exported document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateSpec {
    pub id: u16,
    pub name: String,
    pub pattern_type: Option<String>,
    pub regex: Option<String>,
    pub is_initial: bool,
    pub is_accepting: bool,
    /// Target state ids of this state's outgoing transitions.
    pub transitions: Vec<u16>,
}

/// One edge in the exported transition matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransitionSpec {
    pub from: u16,
    pub to: u16,
    pub pattern_type: String,
    pub zero_width: bool,
    pub cost_weight: f64,
}

/// The complete serialized engine specification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecDocument {
    pub protocol_version: String,
    pub schema_version: u32,
    pub zero_trust_enforced: bool,
    pub uscn_normalization_enabled: bool,
    pub governance: GovernanceSpec,
    pub uscn_mappings: Vec<UscnMappingSpec>,
    pub states: Vec<StateSpec>,
    pub transition_matrix: Vec<TransitionSpec>,
}

/// Build the exportable view of `engine`.
pub fn spec_document(engine: &Engine) -> SpecDocument {
    let registry = engine.registry();
    let table = engine.state_table();

    let uscn_mappings = ENCODING_RULES
        .iter()
        .map(|rule| UscnMappingSpec {
            encoded: rule.encoded.to_owned(),
            canonical: rule.canonical.to_owned(),
            security_risk: rule.risk.as_str().to_owned(),
        })
        .collect();

    let states = table
        .states()
        .iter()
        .map(|state| {
            let pattern = state
                .pattern
                .and_then(|idx| registry.patterns().get(idx as usize));
            StateSpec {
                id: state.id,
                name: state.name.clone(),
                pattern_type: pattern.map(|p| p.kind.as_str().to_owned()),
                regex: pattern.map(|p| p.source.clone()),
                is_initial: state.is_initial,
                is_accepting: state.is_accepting,
                transitions: state
                    .transitions
                    .iter()
                    .map(|&ti| table.transitions()[ti].to)
                    .collect(),
            }
        })
        .collect();

    let transition_matrix = table
        .transitions()
        .iter()
        .map(|t| TransitionSpec {
            from: t.from,
            to: t.to,
            pattern_type: registry.patterns()[t.pattern as usize]
                .kind
                .as_str()
                .to_owned(),
            zero_width: t.zero_width,
            cost_weight: t.cost_weight,
        })
        .collect();

    SpecDocument {
        protocol_version: PROTOCOL_VERSION.to_owned(),
        schema_version: SPEC_SCHEMA_VERSION,
        zero_trust_enforced: engine.config().zero_trust,
        uscn_normalization_enabled: true,
        governance: GovernanceSpec {
            cost_threshold: COST_THRESHOLD,
            warning_threshold: WARNING_THRESHOLD,
        },
        uscn_mappings,
        states,
        transition_matrix,
    }
}

impl Engine {
    /// Serialize this engine's recognizer as a language-neutral document.
    pub fn export_spec(&self, format: SpecFormat) -> Result<String, ExportError> {
        let document = spec_document(self);
        match format {
            SpecFormat::Yaml => serde_yaml::to_string(&document)
                .map_err(|err| ExportError::Serialize(err.to_string())),
            SpecFormat::Json => serde_json::to_string_pretty(&document)
                .map_err(|err| ExportError::Serialize(err.to_string())),
            SpecFormat::CHeader => Err(ExportError::UnsupportedFormat(
                SpecFormat::CHeader.as_str().to_owned(),
            )),
        }
    }
}
