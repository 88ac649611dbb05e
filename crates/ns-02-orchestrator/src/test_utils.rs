//! Stub collaborators for workflow tests.
//!
//! All stubs can share one [`CallLog`] so tests can assert the order in which
//! the orchestrator reached them.

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ns_01_service_registry::{InMemoryRegistry, RegistryError, ServiceRegistry};
use parking_lot::Mutex;
use shared_types::{ServiceDescriptor, WorkflowError};
use uuid::Uuid;

use crate::domain::node_spec::ProvisionRequest;
use crate::domain::params::DecentralizationRequest;
use crate::ports::outbound::{
    DecentralizationExecutor, ExecutionContext, NodeProvisioner, ProgressReporter,
};

/// One collaborator call, as seen by the stubs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Provision,
    Decentralize(String),
    Persist(String),
}

/// Ordered record of collaborator calls shared between stubs.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }
}

/// How a stub answers.
#[derive(Debug, Clone)]
pub enum Behavior<T> {
    Succeed(T),
    Fail(WorkflowError),
    /// Never complete. Only cancellation gets the caller out.
    Hang,
}

impl<T: Clone> Behavior<T> {
    async fn play(&self) -> Result<T, WorkflowError> {
        match self {
            Self::Succeed(value) => Ok(value.clone()),
            Self::Fail(error) => Err(error.clone()),
            Self::Hang => std::future::pending().await,
        }
    }
}

/// The `icon-1` node used across workflow tests.
pub fn icon_descriptor() -> ServiceDescriptor {
    ServiceDescriptor::new("icon-1", "http://node:9000", "/ks/icon-1.json", "pw", "0x3")
        .expect("fixture descriptor is valid")
}

pub struct StubProvisioner {
    behavior: Behavior<ServiceDescriptor>,
    calls: AtomicUsize,
    log: CallLog,
}

impl StubProvisioner {
    pub fn new(behavior: Behavior<ServiceDescriptor>) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            log: CallLog::new(),
        }
    }

    pub fn succeeding(descriptor: ServiceDescriptor) -> Self {
        Self::new(Behavior::Succeed(descriptor))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Behavior::Fail(WorkflowError::Provision(message.to_string())))
    }

    pub fn hanging() -> Self {
        Self::new(Behavior::Hang)
    }

    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeProvisioner for StubProvisioner {
    async fn provision(
        &self,
        _ctx: &ExecutionContext,
        _request: &ProvisionRequest,
    ) -> Result<ServiceDescriptor, WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(Call::Provision);
        self.behavior.play().await
    }
}

pub struct StubExecutor {
    behavior: Behavior<()>,
    calls: AtomicUsize,
    requests: Mutex<Vec<DecentralizationRequest>>,
    log: CallLog,
}

impl StubExecutor {
    pub fn new(behavior: Behavior<()>) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            log: CallLog::new(),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Behavior::Succeed(()))
    }

    pub fn failing(message: &str) -> Self {
        Self::new(Behavior::Fail(WorkflowError::Decentralization(
            message.to_string(),
        )))
    }

    pub fn hanging() -> Self {
        Self::new(Behavior::Hang)
    }

    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<DecentralizationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl DecentralizationExecutor for StubExecutor {
    async fn decentralize(
        &self,
        _ctx: &ExecutionContext,
        request: &DecentralizationRequest,
    ) -> Result<(), WorkflowError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        self.log
            .push(Call::Decentralize(request.service_name().to_string()));
        self.behavior.play().await
    }
}

/// Registry wrapper that records every `persist` call and can be told to fail.
pub struct RecordingRegistry<R = InMemoryRegistry> {
    inner: R,
    persisted: Mutex<Vec<(String, ServiceDescriptor)>>,
    failure: Option<String>,
    log: CallLog,
}

impl RecordingRegistry<InMemoryRegistry> {
    pub fn new() -> Self {
        Self::wrap(InMemoryRegistry::new())
    }

    /// Every `persist` fails with an I/O error carrying `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }
}

impl Default for RecordingRegistry<InMemoryRegistry> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ServiceRegistry> RecordingRegistry<R> {
    pub fn wrap(inner: R) -> Self {
        Self {
            inner,
            persisted: Mutex::new(Vec::new()),
            failure: None,
            log: CallLog::new(),
        }
    }

    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    /// Arguments of every `persist` call, in order.
    pub fn persist_calls(&self) -> Vec<(String, ServiceDescriptor)> {
        self.persisted.lock().clone()
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: ServiceRegistry> ServiceRegistry for RecordingRegistry<R> {
    fn persist(
        &self,
        service_name: &str,
        descriptor: &ServiceDescriptor,
    ) -> Result<(), RegistryError> {
        self.persisted
            .lock()
            .push((service_name.to_string(), descriptor.clone()));
        self.log.push(Call::Persist(service_name.to_string()));
        if let Some(message) = &self.failure {
            return Err(RegistryError::Io {
                path: PathBuf::from("services.json"),
                source: io::Error::new(io::ErrorKind::Other, message.clone()),
            });
        }
        self.inner.persist(service_name, descriptor)
    }

    fn get(&self, service_name: &str) -> Result<Option<ServiceDescriptor>, RegistryError> {
        self.inner.get(service_name)
    }

    fn list(&self) -> Result<Vec<ServiceDescriptor>, RegistryError> {
        self.inner.list()
    }

    fn remove(&self, service_name: &str) -> Result<bool, RegistryError> {
        self.inner.remove(service_name)
    }
}

/// Progress reporter that remembers its messages.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn start(&self, _run_id: Uuid, message: &str) {
        self.messages.lock().push(format!("start: {message}"));
    }

    fn stop(&self, _run_id: Uuid, message: &str) {
        self.messages.lock().push(format!("stop: {message}"));
    }
}
