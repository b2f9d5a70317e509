//! Engine configuration
//!
//! Settings a host application or the CLI can load from a RON file.

use pcad_cad::DatumPlaneKind;
use serde::{Deserialize, Serialize};

/// Default tracing filter for the CLI
pub const DEFAULT_LOG_FILTER: &str = "pcad=info";

/// Configuration-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Document engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of undo steps (None = unbounded)
    pub history_limit: Option<usize>,
    /// Unit attached to parameters created without one
    pub default_unit: Option<String>,
    /// Plane new sketches are placed on when none is given
    pub default_plane: DatumPlaneKind,
    /// Tracing filter used when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: None,
            default_unit: None,
            default_plane: DatumPlaneKind::XY,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        ron::from_str(source).map_err(|e| ConfigError::Deserialize(e.to_string()))
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }
}
