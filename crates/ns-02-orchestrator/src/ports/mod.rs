//! # Ports Layer
//!
//! Only outbound ports here. The inbound API is `WorkflowOrchestrator` itself.

pub mod outbound;
