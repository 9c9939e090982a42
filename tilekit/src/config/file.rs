//! Loading and saving layer configuration files.

use std::path::Path;

use ini::Ini;
use thiserror::Error;

use super::settings::LayerConfig;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read or parse the file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to parse an in-memory document
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] ini::ParseError),

    /// Failed to write the file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create the config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl LayerConfig {
    /// Load a layer file. Keys the file leaves out take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse a layer document held in memory.
    pub fn from_ini_str(s: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(s)?;
        super::parser::parse_ini(&ini)
    }

    /// Serialize as a commented INI document.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_ini_string(self)
    }

    /// Write the layer file, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }
        std::fs::write(path, self.to_ini_string()).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }
}
