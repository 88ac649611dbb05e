//! # Registry Errors

use std::io;
use std::path::PathBuf;

use shared_types::WorkflowError;
use thiserror::Error;

/// Errors from reading or writing the service registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The advisory lock on the registry could not be taken.
    #[error("Could not lock registry {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The registry document is not a JSON object.
    #[error("Registry document {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// A stored record exists but does not describe a usable service.
    #[error("Record '{key}' is invalid: {reason}")]
    InvalidRecord { key: String, reason: String },

    /// The key does not match the descriptor's own service name.
    #[error("Key '{key}' does not match descriptor service name '{service_name}'")]
    KeyMismatch { key: String, service_name: String },

    /// Serialization of a record failed.
    #[error("Failed to encode registry document: {0}")]
    Encode(String),
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<RegistryError> for WorkflowError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::KeyMismatch { .. } => WorkflowError::Validation(err.to_string()),
            other => WorkflowError::Persistence(other.to_string()),
        }
    }
}
