//! # Node Workflow Orchestrator (ns-02)
//!
//! Starts a blockchain node inside the orchestration sandbox, optionally
//! decentralizes it onto the wider network, and records the resulting
//! service descriptor in the service registry.
//!
//! ## Workflow (start command)
//!
//! ```text
//! Init ──→ Provisioning ──→ Provisioned ──┬──────────────────────────────────┐
//!              │                          │ decentralize = true              │
//!              ↓                          ↓                                  │
//!      Failed(ProvisionFailure)    BuildingParams ──→ Decentralizing         │
//!                                                        │        │          │
//!                                                     success   failure      │
//!                                                        ↓        │ (recorded)
//!                                                  Decentralized  │          │
//!                                                        ↓        ↓          ↓
//!                                                       Persisting ←─────────┘
//!                                                        │
//!                                          Done / Failed(originating kind)
//! ```
//!
//! The decentralize-existing entry point runs
//! `Init → BuildingParams → Decentralizing → Done | Failed` and never
//! provisions or persists.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Parameter builder, provision inputs, state machine, results
//! - `ports/` - Sandbox-facing traits (provisioner, executor, progress)
//! - `service.rs` - `WorkflowOrchestrator`, the failure policy lives here
//! - `adapters/` - JSON-RPC sandbox client, tracing progress reporter
//! - `config.rs` - Per-invocation and runtime configuration

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use adapters::progress::TracingProgress;
pub use adapters::sandbox::{SandboxError, SandboxRpcClient};
pub use config::{
    ConfigError, DecentralizeConfig, FailurePolicy, RuntimeConfig, WorkflowConfig,
    DEFAULT_SANDBOX_ENDPOINT,
};
pub use domain::node_spec::{GenesisSource, NodeConfig, ProvisionRequest, DEFAULT_GENESIS_FILE};
pub use domain::params::DecentralizationRequest;
pub use domain::result::{WorkflowResult, WorkflowStatus};
pub use domain::state::WorkflowState;
pub use ports::outbound::{
    DecentralizationExecutor, ExecutionContext, NodeProvisioner, ProgressReporter,
};
pub use service::WorkflowOrchestrator;
