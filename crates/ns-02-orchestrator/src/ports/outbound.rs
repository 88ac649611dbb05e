//! # Outbound Ports (Driven Side)
//!
//! What the orchestrator needs from the sandbox: a way to start a node, a way
//! to submit a node for decentralization, and somewhere to report progress.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{ServiceDescriptor, WorkflowError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::node_spec::ProvisionRequest;
use crate::domain::params::DecentralizationRequest;

/// Cancellation scope and correlation id of one run.
///
/// Cloning is cheap and clones share the same token.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    cancel: CancellationToken,
    run_id: Uuid,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Run under an existing token, e.g. one cancelled by a Ctrl-C handler.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            run_id: Uuid::new_v4(),
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Request cancellation of everything running under this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Starts a node in the sandbox.
#[async_trait]
pub trait NodeProvisioner: Send + Sync {
    /// Start a node and return its descriptor.
    ///
    /// No retry happens at this layer.
    ///
    /// # Errors
    /// * `WorkflowError::Provision` - the sandbox failed, or replied without
    ///   a complete descriptor
    /// * `WorkflowError::Cancelled` - the context was cancelled
    async fn provision(
        &self,
        ctx: &ExecutionContext,
        request: &ProvisionRequest,
    ) -> Result<ServiceDescriptor, WorkflowError>;
}

/// Submits a running node for decentralization.
#[async_trait]
pub trait DecentralizationExecutor: Send + Sync {
    /// Submit `request` to the sandbox.
    ///
    /// Calls are not deduplicated. Submitting the same node twice sends two
    /// requests; avoiding that is up to the caller.
    ///
    /// # Errors
    /// * `WorkflowError::Validation` - the request is incomplete; nothing
    ///   was sent
    /// * `WorkflowError::Decentralization` - the sandbox rejected the request
    ///   or could not be reached
    /// * `WorkflowError::Cancelled` - the context was cancelled
    async fn decentralize(
        &self,
        ctx: &ExecutionContext,
        request: &DecentralizationRequest,
    ) -> Result<(), WorkflowError>;
}

/// User-facing progress indicator around long sandbox calls.
///
/// Calls are tagged with the run id; one reporter may see overlapping runs.
pub trait ProgressReporter: Send + Sync {
    fn start(&self, run_id: Uuid, message: &str);
    fn stop(&self, run_id: Uuid, message: &str);
}

#[async_trait]
impl<T: NodeProvisioner + ?Sized> NodeProvisioner for Arc<T> {
    async fn provision(
        &self,
        ctx: &ExecutionContext,
        request: &ProvisionRequest,
    ) -> Result<ServiceDescriptor, WorkflowError> {
        (**self).provision(ctx, request).await
    }
}

#[async_trait]
impl<T: DecentralizationExecutor + ?Sized> DecentralizationExecutor for Arc<T> {
    async fn decentralize(
        &self,
        ctx: &ExecutionContext,
        request: &DecentralizationRequest,
    ) -> Result<(), WorkflowError> {
        (**self).decentralize(ctx, request).await
    }
}
