//! User settings for bankrec
//!
//! Persisted as `config.json` in the base directory. Every field has a serde
//! default so older files keep loading as fields are added.

use serde::{Deserialize, Serialize};

use super::paths::RecPaths;
use crate::error::RecError;

/// Rules applied when reconciliation sessions are opened and completed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSettings {
    /// Reject a new session whose statement date is not after the latest completed one
    #[serde(default)]
    pub require_chronological_statements: bool,

    /// Name stamped as `completed_by` on completion
    #[serde(default = "default_completed_by")]
    pub completed_by: String,
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        Self {
            require_chronological_statements: false,
            completed_by: default_completed_by(),
        }
    }
}

/// User settings for bankrec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format for display (strftime)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub reconciliation: ReconciliationSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_completed_by() -> String {
    "system".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
            reconciliation: ReconciliationSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, falling back to defaults if the file doesn't exist
    pub fn load_or_create(paths: &RecPaths) -> Result<Self, RecError> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| RecError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| RecError::Config(format!("Failed to parse settings file: {}", e)))
    }

    /// Save settings to disk
    pub fn save(&self, paths: &RecPaths) -> Result<(), RecError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| RecError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| RecError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}
