//! Error types for cadag_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using cadag_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while importing into or resolving from the DAG.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A content key is absent from the backing store.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// Stored bytes are not a valid canonical encoding.
    #[error("Malformed object: {reason}")]
    Malformed { reason: String },

    /// A path segment has no matching link, or walks through a blob.
    #[error("Path not found: {segment} (in {path})")]
    PathNotFound { path: String, segment: String },

    /// The backing store rejected a write during import.
    #[error("Store failure while writing {key}: {source}")]
    StoreFailure {
        key: String,
        #[source]
        source: Box<Error>,
    },

    /// Object file on disk is corrupted (envelope or hash mismatch).
    #[error("Corrupted object at {path}: {reason}")]
    CorruptedObject { path: PathBuf, reason: String },

    /// Store is invalid or not initialized.
    #[error("Invalid store at {path}: {reason}")]
    InvalidStore { path: PathBuf, reason: String },

    /// Invalid hash format or encoding.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// Invalid link or directory entry name.
    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    /// A filesystem entry that cannot be imported (symlink, device, socket).
    #[error("Unsupported entry at {path}: {reason}")]
    UnsupportedEntry { path: PathBuf, reason: String },

    /// Invalid DAG configuration.
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Compression or decompression failed.
    #[error("Compression error: {reason}")]
    Compression { reason: String },
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// Create a Malformed error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::Malformed {
            reason: reason.into(),
        }
    }

    /// Create a PathNotFound error.
    pub fn path_not_found(path: impl Into<String>, segment: impl Into<String>) -> Self {
        Error::PathNotFound {
            path: path.into(),
            segment: segment.into(),
        }
    }

    /// Wrap an error reported by the backing store on `put`.
    pub fn store_failure(key: impl Into<String>, source: Error) -> Self {
        Error::StoreFailure {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Create a CorruptedObject error.
    pub fn corrupted_object(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedObject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidStore error.
    pub fn invalid_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an InvalidName error.
    pub fn invalid_name(reason: impl Into<String>) -> Self {
        Error::InvalidName {
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedEntry error.
    pub fn unsupported_entry(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::UnsupportedEntry {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Create a Compression error.
    pub fn compression_error(reason: impl Into<String>) -> Self {
        Error::Compression {
            reason: reason.into(),
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}

impl From<ignore::Error> for Error {
    fn from(err: ignore::Error) -> Self {
        // ignore::Error can wrap an io::Error or be a path error
        match err.io_error() {
            Some(io_err) => Error::Io {
                source: std::io::Error::new(io_err.kind(), io_err.to_string()),
            },
            None => Error::Io {
                source: std::io::Error::other(err.to_string()),
            },
        }
    }
}
