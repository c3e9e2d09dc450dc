//! YAML configuration file support for the admission pipeline.
//!
//! Deployments describe the normalizer and engine in a single YAML file and
//! load it at startup, instead of hand-assembling the stage configs in code.
//!
//! ## Example configuration
//!
//! ```yaml
//! # Admission pipeline configuration
//! version: "1.0"
//! name: "edge-ingress"
//!
//! uscn:
//!   version: 1
//!   fold_case: true
//!   fold_whitespace: true
//!   strict_utf8: false
//!
//! engine:
//!   zero_trust: true
//!   max_recovery_skips: 0
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use engine::EngineConfig;
use uscn::UscnConfig;

/// Errors that can occur when loading YAML configuration files.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for the admission pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdmitConfig {
    /// Configuration format version.
    pub version: String,

    /// Optional configuration name/description.
    #[serde(default)]
    pub name: Option<String>,

    /// Normalizer configuration.
    #[serde(default)]
    pub uscn: UscnYamlConfig,

    /// Engine configuration.
    #[serde(default)]
    pub engine: EngineYamlConfig,
}

impl AdmitConfig {
    /// Load a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: AdmitConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;
        self.uscn.validate()?;
        self.engine.validate()?;
        Ok(())
    }

    /// Assemble the engine construction config described by this file.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            zero_trust: self.engine.zero_trust,
            uscn: self.uscn.to_uscn_config(),
            max_recovery_skips: self.engine.max_recovery_skips,
        }
    }
}

/// Normalizer section of the YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UscnYamlConfig {
    #[serde(default = "UscnYamlConfig::default_version")]
    pub version: u32,
    #[serde(default = "UscnYamlConfig::default_true")]
    pub fold_case: bool,
    #[serde(default = "UscnYamlConfig::default_true")]
    pub fold_whitespace: bool,
    #[serde(default)]
    pub strict_utf8: bool,
}

impl UscnYamlConfig {
    fn default_version() -> u32 {
        1
    }

    fn default_true() -> bool {
        true
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.version == 0 {
            return Err(ConfigLoadError::Validation(
                "uscn.version must be >= 1".into(),
            ));
        }
        Ok(())
    }

    fn to_uscn_config(&self) -> UscnConfig {
        UscnConfig {
            version: self.version,
            fold_case: self.fold_case,
            fold_whitespace: self.fold_whitespace,
            strict_utf8: self.strict_utf8,
        }
    }
}

impl Default for UscnYamlConfig {
    fn default() -> Self {
        Self {
            version: Self::default_version(),
            fold_case: true,
            fold_whitespace: true,
            strict_utf8: false,
        }
    }
}

/// Engine section of the YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineYamlConfig {
    #[serde(default = "EngineYamlConfig::default_true")]
    pub zero_trust: bool,
    #[serde(default)]
    pub max_recovery_skips: usize,
}

impl EngineYamlConfig {
    fn default_true() -> bool {
        true
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        Ok(())
    }
}

impl Default for EngineYamlConfig {
    fn default() -> Self {
        Self {
            zero_trust: true,
            max_recovery_skips: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_stage_defaults() {
        let config = AdmitConfig::from_yaml("version: \"1.0\"\n").expect("minimal config loads");
        let engine_cfg = config.to_engine_config();
        assert!(engine_cfg.zero_trust);
        assert_eq!(engine_cfg.max_recovery_skips, 0);
        assert_eq!(engine_cfg.uscn, UscnConfig::default());
    }

    #[test]
    fn full_config_round_trips_into_engine_config() {
        let yaml = r#"
version: "1.0"
name: "edge-ingress"
uscn:
  version: 2
  fold_case: true
  fold_whitespace: false
  strict_utf8: true
engine:
  zero_trust: false
  max_recovery_skips: 3
"#;
        let config = AdmitConfig::from_yaml(yaml).expect("full config loads");
        assert_eq!(config.name.as_deref(), Some("edge-ingress"));

        let engine_cfg = config.to_engine_config();
        assert!(!engine_cfg.zero_trust);
        assert_eq!(engine_cfg.max_recovery_skips, 3);
        assert_eq!(engine_cfg.uscn.version, 2);
        assert!(!engine_cfg.uscn.fold_whitespace);
        assert!(engine_cfg.uscn.strict_utf8);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let result = AdmitConfig::from_yaml("version: \"9.9\"\n");
        assert!(matches!(
            result,
            Err(ConfigLoadError::UnsupportedVersion(v)) if v == "9.9"
        ));
    }

    #[test]
    fn zero_uscn_version_is_rejected() {
        let yaml = "version: \"1.0\"\nuscn:\n  version: 0\n";
        assert!(matches!(
            AdmitConfig::from_yaml(yaml),
            Err(ConfigLoadError::Validation(_))
        ));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        assert!(matches!(
            AdmitConfig::from_yaml(": not yaml"),
            Err(ConfigLoadError::YamlParse(_))
        ));
    }
}
