//! Heat map configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.
//!
//! ```yaml
//! marker_format: dot_plus_word
//! marker_glyph: "●"
//! emit_unresolved_parents: true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::presenter::{MarkerFormat, DEFAULT_MARKER_GLYPH};

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Options for a heat map run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeatmapConfig {
    /// Sub-operation marker style
    pub marker_format: MarkerFormat,

    /// Glyph used for sub-operation markers
    pub marker_glyph: String,

    /// Emit an explicit N/A result for parents with neither child nor own data
    pub emit_unresolved_parents: bool,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            marker_format: MarkerFormat::default(),
            marker_glyph: DEFAULT_MARKER_GLYPH.to_string(),
            emit_unresolved_parents: false,
        }
    }
}

impl HeatmapConfig {
    /// Parse a config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: HeatmapConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.marker_glyph.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "marker_glyph must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
