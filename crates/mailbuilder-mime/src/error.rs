//! Error types for MIME composition.

use std::io;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
///
/// Absent or empty inputs are never errors; they are normalized by the
/// composition engine. Only unrecoverable conditions end up here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A binary payload could not be produced.
    #[error("Cannot read payload for {part}: {source}")]
    Payload {
        /// Name, content id or path identifying the failing part.
        part: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
}

impl Error {
    /// Creates a payload error for the given part.
    #[must_use]
    pub fn payload(part: impl Into<String>, source: io::Error) -> Self {
        Self::Payload {
            part: part.into(),
            source,
        }
    }
}
