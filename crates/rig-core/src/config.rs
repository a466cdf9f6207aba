//! Read-only configuration surface consumed by the state machinery.

use crate::errors::{ErrorInfo, RigError};

/// Read-only view onto an externally loaded configuration.
///
/// The harness's configuration loader is a separate concern; the state core
/// only needs to resolve a handful of dotted keys through this trait.
pub trait ConfigView {
    /// Returns the raw string value stored under the dotted key, if any.
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Persistence settings sourced from configuration by the CLI glue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSettings {
    /// Path of the backing state file.
    pub filename: String,
    /// Number of rotated generations to retain on save.
    pub rotate_n_state_files: usize,
    /// Deflate level applied to container entries.
    pub compression_level: i32,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            filename: "experiment_state.rig".to_string(),
            rotate_n_state_files: 0,
            compression_level: 5,
        }
    }
}

impl StateSettings {
    /// Resolves the settings from a configuration view, falling back to
    /// defaults for absent keys.
    pub fn from_config(config: &dyn ConfigView) -> Result<Self, RigError> {
        let defaults = Self::default();
        let filename = config
            .lookup("state.filename")
            .unwrap_or(defaults.filename);
        let rotate_n_state_files = match config.lookup("state.rotate_n_state_files") {
            Some(raw) => raw.parse::<usize>().map_err(|err| {
                RigError::MalformedKey(
                    ErrorInfo::new(
                        "config.rotate_n_state_files",
                        "rotation count is not a non-negative integer",
                    )
                    .with_context("value", raw)
                    .with_hint(err.to_string()),
                )
            })?,
            None => defaults.rotate_n_state_files,
        };
        let compression_level = match config.lookup("state.compression_level") {
            Some(raw) => raw.parse::<i32>().map_err(|err| {
                RigError::MalformedKey(
                    ErrorInfo::new(
                        "config.compression_level",
                        "compression level is not an integer",
                    )
                    .with_context("value", raw)
                    .with_hint(err.to_string()),
                )
            })?,
            None => defaults.compression_level,
        };
        Ok(Self {
            filename,
            rotate_n_state_files,
            compression_level,
        })
    }
}
