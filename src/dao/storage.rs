use std::{error::Error, io, path::PathBuf};
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of where the scores live.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing file could not be read.
    #[error("failed to read `{path}`")]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The backing file could not be written.
    #[error("failed to write `{path}`")]
    Write {
        /// File or directory that was being written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The stored document is not valid JSON for the expected model.
    #[error("failed to decode `{path}`")]
    Decode {
        /// File holding the document.
        path: PathBuf,
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },
    /// The score list could not be serialized.
    #[error("failed to encode score list")]
    Encode {
        /// Serializer failure.
        #[source]
        source: serde_json::Error,
    },
    /// The stored document was written by an incompatible version.
    #[error("unsupported score file version {version} in `{path}`")]
    UnsupportedVersion {
        /// File holding the document.
        path: PathBuf,
        /// Version found in the document.
        version: u32,
    },
    /// The backend refuses writes, for example after its contents could not be read.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What is unavailable and why.
        message: String,
        /// Failure that made the backend unavailable.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
