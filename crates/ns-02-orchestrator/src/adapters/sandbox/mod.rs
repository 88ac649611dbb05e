//! JSON-RPC client for the orchestration sandbox.

pub mod types;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{DescriptorField, Phase, ServiceDescriptor, WorkflowError};
use thiserror::Error;
use tracing::debug;

use crate::config::RuntimeConfig;
use crate::domain::node_spec::ProvisionRequest;
use crate::domain::params::DecentralizationRequest;
use crate::ports::outbound::{DecentralizationExecutor, ExecutionContext, NodeProvisioner};

use self::types::*;

/// Errors that can occur when talking to the sandbox.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Cannot connect to sandbox at {0}")]
    Connection(String),
    #[error("{0}")]
    Rpc(String),
    #[error("Failed to parse response: {0}")]
    Parse(String),
    #[error("Sandbox reply is missing the {0}")]
    IncompleteReply(DescriptorField),
}

/// Sandbox client implementing both [`NodeProvisioner`] and
/// [`DecentralizationExecutor`].
pub struct SandboxRpcClient {
    client: Client,
    base_url: String,
    request_timeout: Option<std::time::Duration>,
    request_id: AtomicU64,
}

impl SandboxRpcClient {
    pub fn new(config: &RuntimeConfig) -> Result<Self, SandboxError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.sandbox_endpoint.clone(),
            request_timeout: config.request_timeout(),
            request_id: AtomicU64::new(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a JSON-RPC method. `Ok(None)` means the call succeeded without a
    /// result value.
    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<Option<R>, SandboxError> {
        let id = self.next_id();
        let request = JsonRpcRequest::new(method, params, id);
        debug!(method, id, url = %self.base_url, "Sandbox request");

        let mut builder = self.client.post(&self.base_url).json(&request);
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                SandboxError::Connection(self.base_url.clone())
            } else {
                SandboxError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SandboxError::Rpc(format!("sandbox returned HTTP {status}")));
        }

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| SandboxError::Parse(e.to_string()))?;

        if rpc_response.id != id {
            return Err(SandboxError::Parse(format!(
                "response id {} does not match request id {id}",
                rpc_response.id
            )));
        }
        if let Some(error) = rpc_response.error {
            return Err(SandboxError::Rpc(error.to_string()));
        }

        Ok(rpc_response.result)
    }

    async fn start_node(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ServiceDescriptor, SandboxError> {
        let reply: StartNodeReply = self
            .call(METHOD_START_NODE, StartNodeParams::from(request))
            .await?
            .ok_or_else(|| SandboxError::Parse("missing result in response".to_string()))?;

        if let Some(field) = reply.missing_field() {
            return Err(SandboxError::IncompleteReply(field));
        }
        reply
            .to_descriptor()
            .ok_or_else(|| SandboxError::Parse("unusable descriptor in reply".to_string()))
    }

    async fn submit_decentralization(
        &self,
        request: &DecentralizationRequest,
    ) -> Result<(), SandboxError> {
        self.call::<_, serde_json::Value>(METHOD_DECENTRALIZE, DecentralizeParams::from(request))
            .await?;
        Ok(())
    }
}

/// Run `call` unless `ctx` is cancelled first.
async fn cancellable<T>(
    ctx: &ExecutionContext,
    phase: Phase,
    call: impl Future<Output = Result<T, SandboxError>>,
) -> Result<Result<T, SandboxError>, WorkflowError> {
    if ctx.is_cancelled() {
        return Err(WorkflowError::Cancelled { phase });
    }
    tokio::select! {
        biased;
        _ = ctx.cancel_token().cancelled() => Err(WorkflowError::Cancelled { phase }),
        result = call => Ok(result),
    }
}

#[async_trait]
impl NodeProvisioner for SandboxRpcClient {
    async fn provision(
        &self,
        ctx: &ExecutionContext,
        request: &ProvisionRequest,
    ) -> Result<ServiceDescriptor, WorkflowError> {
        request.node_config.validate()?;
        cancellable(ctx, Phase::Provision, self.start_node(request))
            .await?
            .map_err(|e| WorkflowError::Provision(e.to_string()))
    }
}

#[async_trait]
impl DecentralizationExecutor for SandboxRpcClient {
    async fn decentralize(
        &self,
        ctx: &ExecutionContext,
        request: &DecentralizationRequest,
    ) -> Result<(), WorkflowError> {
        request.validate()?;
        cancellable(ctx, Phase::Decentralize, self.submit_decentralization(request))
            .await?
            .map_err(|e| WorkflowError::Decentralization(e.to_string()))
    }
}
