//! CLI error handling with user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tilekit::config::ConfigFileError;
use tilekit::delegate::DelegateError;
use tilekit::layer::LayerError;

/// CLI errors, each mapped to a message and exit code 1.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Layer file could not be loaded
    Config(ConfigFileError),
    /// A delegate definition did not resolve, or the kit is incomplete
    Delegates(DelegateError),
    /// Tile access failed
    Layer(LayerError),
    /// Failed to read or decode an input image
    ImageRead { path: PathBuf, error: image::ImageError },
    /// Failed to write an output image
    ImageWrite { path: PathBuf, error: image::ImageError },
    /// The tile could not be retrieved or decoded
    TileUnavailable(String),
}

impl CliError {
    /// Print the error and exit the process.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Delegates(DelegateError::Unrecognized { .. }) = self {
            eprintln!();
            eprintln!("Run 'tilekit delegates' to list the available delegate types.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Delegates(e) => write!(f, "Delegate configuration error: {}", e),
            CliError::Layer(e) => write!(f, "{}", e),
            CliError::ImageRead { path, error } => {
                write!(f, "Failed to read image '{}': {}", path.display(), error)
            }
            CliError::ImageWrite { path, error } => {
                write!(f, "Failed to write image '{}': {}", path.display(), error)
            }
            CliError::TileUnavailable(tile) => write!(f, "Tile {} is unavailable", tile),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Delegates(e) => Some(e),
            CliError::Layer(e) => Some(e),
            CliError::ImageRead { error, .. } | CliError::ImageWrite { error, .. } => Some(error),
            CliError::TileUnavailable(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<DelegateError> for CliError {
    fn from(e: DelegateError) -> Self {
        CliError::Delegates(e)
    }
}

impl From<LayerError> for CliError {
    fn from(e: LayerError) -> Self {
        CliError::Layer(e)
    }
}
