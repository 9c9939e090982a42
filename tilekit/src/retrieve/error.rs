//! Retrieval error types.

use thiserror::Error;

/// Errors raised while retrieving tile bytes.
///
/// The type is `Clone` so that a [`Retrieval`](super::Retrieval)'s stored
/// error can be handed to every waiter and re-raised by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// Connection or transfer failure
    #[error("Network error retrieving {url}: {reason}")]
    Network { url: String, reason: String },

    /// Connect or read timeout elapsed
    #[error("Timed out retrieving {url}")]
    Timeout { url: String },

    /// Server answered with a non-success status
    #[error("HTTP {code} from {url}: {message}")]
    HttpStatus {
        url: String,
        code: i32,
        message: String,
    },

    /// Server answered with a text body where image data was expected
    #[error("Server error message from {url}: {message}")]
    ServerMessage { url: String, message: String },

    /// Retrieval finished without data, error, or cancellation
    #[error("Could not retrieve {url}")]
    NoData { url: String },

    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    /// Payload is not a readable ZIP archive
    #[error("Invalid archive: {0}")]
    Archive(String),

    #[error("Archive entry '{0}' not found")]
    ArchiveEntryNotFound(String),

    #[error("Retrieval service has shut down")]
    ServiceShutdown,

    /// Post-processor could not persist the payload
    #[error("Failed to save {path}: {reason}")]
    Save { path: String, reason: String },
}

impl RetrievalError {
    pub(crate) fn io(path: impl Into<String>, err: &std::io::Error) -> Self {
        RetrievalError::Io {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
