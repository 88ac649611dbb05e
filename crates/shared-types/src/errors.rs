//! # Error Types
//!
//! Error kinds shared by every phase of the node workflow.
//!
//! | Kind | Code | Raised when |
//! |------|------|-------------|
//! | `ValidationFailure` | 1001 | input is missing or malformed, before any external call |
//! | `ProvisionFailure` | 1002 | the sandbox could not start the node |
//! | `DecentralizationFailure` | 1003 | the network rejected the decentralization |
//! | `PersistenceFailure` | 1004 | the service record could not be written |
//! | `Cancelled` | 1005 | the operator aborted an in-flight call |

use std::fmt;

use thiserror::Error;

use crate::entities::DescriptorField;

/// Workflow phase an error or log line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Provision,
    BuildParams,
    Decentralize,
    Persist,
}

impl Phase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::BuildParams => "build-params",
            Self::Decentralize => "decentralize",
            Self::Persist => "persist",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a `WorkflowError`, carrying its stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationFailure,
    ProvisionFailure,
    DecentralizationFailure,
    PersistenceFailure,
    Cancelled,
}

impl ErrorKind {
    /// Stable numeric code. Never renumber.
    #[must_use]
    pub fn code(&self) -> u16 {
        match self {
            Self::ValidationFailure => 1001,
            Self::ProvisionFailure => 1002,
            Self::DecentralizationFailure => 1003,
            Self::PersistenceFailure => 1004,
            Self::Cancelled => 1005,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailure => "ValidationFailure",
            Self::ProvisionFailure => "ProvisionFailure",
            Self::DecentralizationFailure => "DecentralizationFailure",
            Self::PersistenceFailure => "PersistenceFailure",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while provisioning, decentralizing or recording a node.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
    /// Missing or malformed input, caught before any external call.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The sandbox could not start the node.
    #[error("Node provisioning failed: {0}")]
    Provision(String),

    /// The network or sandbox rejected the decentralization operation.
    #[error("Decentralization failed: {0}")]
    Decentralization(String),

    /// The service record could not be written.
    #[error("Service record not persisted: {0}")]
    Persistence(String),

    /// The caller aborted an in-flight operation.
    #[error("Operation cancelled during {phase}")]
    Cancelled { phase: Phase },
}

impl WorkflowError {
    /// Validation error for an empty required field.
    #[must_use]
    pub fn missing_field(field: DescriptorField) -> Self {
        Self::Validation(format!("{field} is required and must not be empty"))
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::Provision(_) => ErrorKind::ProvisionFailure,
            Self::Decentralization(_) => ErrorKind::DecentralizationFailure,
            Self::Persistence(_) => ErrorKind::PersistenceFailure,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Shorthand for `self.kind().code()`.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
