//! # Domain Layer
//!
//! Pure workflow logic, no I/O besides reading the operator's input files.

pub mod node_spec;
pub mod params;
pub mod result;
pub mod state;
