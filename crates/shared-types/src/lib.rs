//! # Shared Types Crate
//!
//! Domain entities and error types shared across the workspace.
//!
//! ## Design Principles
//!
//! - **Valid by construction**: a `ServiceDescriptor` can only exist with all
//!   five fields populated. Deserialization runs the same checks.
//! - **Stable error codes**: every `WorkflowError` maps to an `ErrorKind` with
//!   a fixed numeric code that log consumers can match on.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
