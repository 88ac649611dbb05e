//! # Adapters Layer
//!
//! - `sandbox` - JSON-RPC client implementing the provisioner and executor ports
//! - `progress` - `ProgressReporter` backed by `tracing`

pub mod progress;
pub mod sandbox;
