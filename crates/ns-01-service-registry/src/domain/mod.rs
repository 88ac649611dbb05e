//! # Domain Layer
//!
//! Record shape stored per key, and registry errors.

pub mod errors;
pub mod record;
