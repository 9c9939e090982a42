//! Delegate pipeline error types.

use std::path::PathBuf;

use thiserror::Error;

use super::definition::DefinitionError;
use crate::retrieve::RetrievalError;

/// Configuration errors raised while resolving definitions or assembling kits.
///
/// These are fatal at layer construction.
#[derive(Debug, Error)]
pub enum DelegateError {
    /// No registered delegate type accepts the definition
    #[error("Unrecognized delegate '{definition}'")]
    Unrecognized { definition: String },

    /// The delegate implements no role a kit can hold
    #[error("Delegate '{definition}' does not fit any kit slot")]
    Unroutable { definition: String },

    /// A mandatory kit slot is empty
    #[error("Delegate kit is missing a {missing}")]
    IncompleteKit { missing: &'static str },

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Errors from decoding a local tile file into a raster.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Not a local file URL: {0}")]
    NotAFileUrl(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Errors from loading a tile's texture.
#[derive(Debug, Error)]
pub enum TileLoadError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("Invalid tile URL: {0}")]
    Url(#[from] url::ParseError),
}
