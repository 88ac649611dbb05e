//! # Workflow Orchestrator
//!
//! Drives one run through provisioning, optional decentralization and
//! persistence.
//!
//! ## Failure Policy
//!
//! | Failure | Start workflow | Decentralize-existing |
//! |---------|----------------|-----------------------|
//! | Invalid genesis or node config | `Init -> Failed`; `Provisioning` is never entered | n/a |
//! | Invalid decentralization params | stop before the executor | stop before the executor |
//! | Provisioning | stop; nothing persisted | n/a |
//! | Decentralization | recorded; node still persisted | run fails |
//! | Persistence | reported; earlier phases are not rolled back | n/a |
//! | Registry lock held too long | persistence failure | n/a |
//! | Cancellation | failure of the phase it interrupted | same |
//!
//! Decentralization failures follow `FailurePolicy`: the default
//! `RecordWhatSucceeded` persists the node, `AbortOnDecentralizationFailure`
//! skips persistence.

use std::future::Future;
use std::sync::Arc;

use ns_01_service_registry::ServiceRegistry;
use ns_telemetry::log_event;
use shared_types::{Phase, ServiceDescriptor, WorkflowError};

use crate::adapters::progress::TracingProgress;
use crate::config::{DecentralizeConfig, FailurePolicy, WorkflowConfig};
use crate::domain::node_spec::ProvisionRequest;
use crate::domain::params::DecentralizationRequest;
use crate::domain::result::{RunRecorder, WorkflowResult};
use crate::domain::state::WorkflowState;
use crate::ports::outbound::{
    DecentralizationExecutor, ExecutionContext, NodeProvisioner, ProgressReporter,
};

/// Owns the three collaborators of a workflow run.
///
/// One orchestrator may serve concurrent runs; each run carries its own
/// `ExecutionContext`.
pub struct WorkflowOrchestrator<P, D, R>
where
    P: NodeProvisioner,
    D: DecentralizationExecutor,
    R: ServiceRegistry,
{
    provisioner: P,
    executor: D,
    registry: R,
    progress: Arc<dyn ProgressReporter>,
}

impl<P, D, R> WorkflowOrchestrator<P, D, R>
where
    P: NodeProvisioner,
    D: DecentralizationExecutor,
    R: ServiceRegistry,
{
    pub fn new(provisioner: P, executor: D, registry: R) -> Self {
        Self {
            provisioner,
            executor,
            registry,
            progress: Arc::new(TracingProgress::new()),
        }
    }

    /// Replace the default `tracing` progress reporter.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    pub fn executor(&self) -> &D {
        &self.executor
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Start a node, optionally decentralize it, and record it.
    ///
    /// Never returns early with an error: every failure is captured in the
    /// returned `WorkflowResult`.
    pub async fn run_workflow(
        &self,
        ctx: &ExecutionContext,
        config: &WorkflowConfig,
    ) -> WorkflowResult {
        let mut run = RunRecorder::new(ctx.run_id());
        log_event!(
            info,
            Phase::Provision,
            "Workflow started",
            run_id = %ctx.run_id(),
            decentralize = config.decentralize
        );

        let request = match ProvisionRequest::from_config(config) {
            Ok(request) => request,
            Err(e) => {
                run.fail(Phase::Provision, e);
                return run.finish();
            }
        };

        let Some(descriptor) = self.provision(ctx, &mut run, &request).await else {
            return run.finish();
        };

        if config.decentralize {
            let request = DecentralizationRequest::from_descriptor(&descriptor);
            let decentralized = self.decentralize(ctx, &mut run, request).await;

            if !decentralized
                && config.failure_policy == FailurePolicy::AbortOnDecentralizationFailure
            {
                log_event!(
                    warn,
                    Phase::Persist,
                    "Skipping persistence after decentralization failure",
                    run_id = %ctx.run_id(),
                    service = %descriptor.service_name()
                );
                return run.finish();
            }
        }

        self.persist(ctx, &mut run, &descriptor);
        run.finish()
    }

    /// Decentralize an already running node. Never provisions or persists.
    pub async fn run_decentralize(
        &self,
        ctx: &ExecutionContext,
        config: &DecentralizeConfig,
    ) -> WorkflowResult {
        let mut run = RunRecorder::new(ctx.run_id());
        log_event!(
            info,
            Phase::Decentralize,
            "Decentralization of existing node started",
            run_id = %ctx.run_id(),
            service = %config.service_name
        );

        let request = DecentralizationRequest::build(
            &config.service_name,
            &config.node_endpoint,
            &config.keystore_path,
            &config.key_password,
            &config.network_id,
        );
        self.decentralize(ctx, &mut run, request).await;
        run.finish()
    }

    async fn provision(
        &self,
        ctx: &ExecutionContext,
        run: &mut RunRecorder,
        request: &ProvisionRequest,
    ) -> Option<ServiceDescriptor> {
        run.advance(WorkflowState::Provisioning);
        self.progress.start(ctx.run_id(), "Starting ICON node");

        let outcome = guarded(
            ctx,
            Phase::Provision,
            self.provisioner.provision(ctx, request),
        )
        .await;
        match outcome {
            Ok(descriptor) => {
                self.progress.stop(ctx.run_id(), "ICON node started");
                log_event!(
                    info,
                    Phase::Provision,
                    "Node provisioned",
                    run_id = %ctx.run_id(),
                    service = %descriptor.service_name(),
                    endpoint = %descriptor.private_endpoint()
                );
                run.advance(WorkflowState::Provisioned);
                run.set_descriptor(descriptor.clone());
                Some(descriptor)
            }
            Err(e) => {
                self.progress.stop(ctx.run_id(), "ICON node failed to start");
                run.fail(Phase::Provision, e);
                None
            }
        }
    }

    /// Returns whether the executor accepted the request.
    async fn decentralize(
        &self,
        ctx: &ExecutionContext,
        run: &mut RunRecorder,
        request: Result<DecentralizationRequest, WorkflowError>,
    ) -> bool {
        run.advance(WorkflowState::BuildingParams);
        let request = match request.and_then(|r| r.validate().map(|()| r)) {
            Ok(request) => request,
            Err(e) => {
                run.fail(Phase::BuildParams, e);
                return false;
            }
        };

        run.advance(WorkflowState::Decentralizing);
        self.progress.start(
            ctx.run_id(),
            &format!("Decentralizing {}", request.service_name()),
        );

        let outcome = guarded(
            ctx,
            Phase::Decentralize,
            self.executor.decentralize(ctx, &request),
        )
        .await;
        match outcome {
            Ok(()) => {
                self.progress.stop(
                    ctx.run_id(),
                    &format!("{} decentralized", request.service_name()),
                );
                log_event!(
                    info,
                    Phase::Decentralize,
                    "Node decentralized",
                    run_id = %ctx.run_id(),
                    service = %request.service_name(),
                    nid = %request.network_id()
                );
                run.advance(WorkflowState::Decentralized);
                true
            }
            Err(e) => {
                self.progress.stop(ctx.run_id(), "Decentralization failed");
                run.fail(Phase::Decentralize, e);
                false
            }
        }
    }

    fn persist(
        &self,
        ctx: &ExecutionContext,
        run: &mut RunRecorder,
        descriptor: &ServiceDescriptor,
    ) {
        run.advance(WorkflowState::Persisting);
        match self.registry.persist(descriptor.service_name(), descriptor) {
            Ok(()) => {
                log_event!(
                    info,
                    Phase::Persist,
                    "Service record written",
                    run_id = %ctx.run_id(),
                    service = %descriptor.service_name()
                );
                run.mark_persisted();
            }
            Err(e) => run.fail(Phase::Persist, e.into()),
        }
    }
}

/// Race `call` against cancellation of `ctx`, so a collaborator that ignores
/// the token still yields `Cancelled`.
async fn guarded<T>(
    ctx: &ExecutionContext,
    phase: Phase,
    call: impl Future<Output = Result<T, WorkflowError>>,
) -> Result<T, WorkflowError> {
    tokio::select! {
        biased;
        _ = ctx.cancel_token().cancelled() => Err(WorkflowError::Cancelled { phase }),
        result = call => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::result::WorkflowStatus;
    use crate::test_utils::*;
    use shared_types::ErrorKind;
    use std::time::Duration;

    type Orchestrator =
        WorkflowOrchestrator<Arc<StubProvisioner>, Arc<StubExecutor>, Arc<RecordingRegistry>>;

    struct Harness {
        provisioner: Arc<StubProvisioner>,
        executor: Arc<StubExecutor>,
        registry: Arc<RecordingRegistry>,
        log: CallLog,
    }

    impl Harness {
        fn new(
            provisioner: StubProvisioner,
            executor: StubExecutor,
            registry: RecordingRegistry,
        ) -> Self {
            let log = CallLog::new();
            Self {
                provisioner: Arc::new(provisioner.with_log(&log)),
                executor: Arc::new(executor.with_log(&log)),
                registry: Arc::new(registry.with_log(&log)),
                log,
            }
        }

        fn happy() -> Self {
            Self::new(
                StubProvisioner::succeeding(icon_descriptor()),
                StubExecutor::succeeding(),
                RecordingRegistry::new(),
            )
        }

        fn orchestrator(&self) -> Orchestrator {
            WorkflowOrchestrator::new(
                self.provisioner.clone(),
                self.executor.clone(),
                self.registry.clone(),
            )
        }
    }

    fn start_config(decentralize: bool) -> WorkflowConfig {
        WorkflowConfig {
            decentralize,
            ..WorkflowConfig::default()
        }
    }

    fn icon_flags() -> DecentralizeConfig {
        DecentralizeConfig {
            service_name: "icon-1".into(),
            node_endpoint: "http://node:9000".into(),
            keystore_path: "/ks/icon-1.json".into(),
            key_password: "pw".into(),
            network_id: "0x3".into(),
        }
    }

    #[tokio::test]
    async fn test_start_without_decentralization_persists() {
        let h = Harness::happy();
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &start_config(false))
            .await;

        assert!(result.is_ok());
        assert!(result.persisted);
        assert_eq!(h.executor.calls(), 0);
        assert_eq!(h.registry.persist_calls().len(), 1);
        assert_eq!(
            result.transitions,
            vec![
                WorkflowState::Init,
                WorkflowState::Provisioning,
                WorkflowState::Provisioned,
                WorkflowState::Persisting,
                WorkflowState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_icon_scenario_end_to_end() {
        let h = Harness::happy();
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &start_config(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::Ok);
        assert_eq!(result.final_state, WorkflowState::Done);
        assert!(result.visited(WorkflowState::Decentralized));

        let stored = h.registry.get("icon-1").unwrap().unwrap();
        assert_eq!(stored, icon_descriptor());
        assert_eq!(stored.private_endpoint(), "http://node:9000");
        assert_eq!(stored.keystore_path(), "/ks/icon-1.json");
        assert_eq!(stored.key_password(), "pw");
        assert_eq!(stored.network_id(), "0x3");

        let sent = h.executor.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], DecentralizationRequest::from_descriptor(&stored).unwrap());
    }

    #[tokio::test]
    async fn test_decentralization_failure_still_persists_once() {
        let h = Harness::new(
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::failing("network unreachable"),
            RecordingRegistry::new(),
        );
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &start_config(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::DecentralizeFailed);
        assert_eq!(result.error_kind(), Some(ErrorKind::DecentralizationFailure));
        assert_eq!(
            result.final_state,
            WorkflowState::Failed(ErrorKind::DecentralizationFailure)
        );
        assert!(result.persisted);
        assert!(!result.visited(WorkflowState::Decentralized));

        assert_eq!(
            h.registry.persist_calls(),
            vec![("icon-1".to_string(), icon_descriptor())]
        );
        assert_eq!(
            h.log.calls(),
            vec![
                Call::Provision,
                Call::Decentralize("icon-1".into()),
                Call::Persist("icon-1".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_abort_policy_skips_persistence() {
        let h = Harness::new(
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::failing("rejected"),
            RecordingRegistry::new(),
        );
        let config = WorkflowConfig {
            decentralize: true,
            failure_policy: FailurePolicy::AbortOnDecentralizationFailure,
            ..WorkflowConfig::default()
        };
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &config)
            .await;

        assert_eq!(result.status, WorkflowStatus::DecentralizeFailed);
        assert!(!result.persisted);
        assert!(h.registry.persist_calls().is_empty());
        assert!(result.descriptor.is_some());
    }

    #[tokio::test]
    async fn test_provision_failure_stops_everything() {
        let h = Harness::new(
            StubProvisioner::failing("sandbox down"),
            StubExecutor::succeeding(),
            RecordingRegistry::new(),
        );
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &start_config(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::ProvisionFailed);
        assert_eq!(result.final_state, WorkflowState::Failed(ErrorKind::ProvisionFailure));
        assert_eq!(result.error.as_ref().map(WorkflowError::code), Some(1002));
        assert!(result.descriptor.is_none());
        assert_eq!(h.executor.calls(), 0);
        assert!(h.registry.persist_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_genesis_never_reaches_sandbox() {
        let h = Harness::happy();
        let config = WorkflowConfig {
            genesis: Some("/no/such/genesis.zip".into()),
            ..WorkflowConfig::default()
        };
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &config)
            .await;

        assert_eq!(result.status, WorkflowStatus::ProvisionFailed);
        assert_eq!(result.error_kind(), Some(ErrorKind::ValidationFailure));
        assert_eq!(h.provisioner.calls(), 0);
        assert!(!result.visited(WorkflowState::Provisioning));
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported() {
        let h = Harness::new(
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::succeeding(),
            RecordingRegistry::failing("disk full"),
        );
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &start_config(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::PersistFailed);
        assert_eq!(result.error_kind(), Some(ErrorKind::PersistenceFailure));
        assert!(result.error.as_ref().unwrap().to_string().contains("disk full"));
        assert!(result.visited(WorkflowState::Decentralized));
        assert!(!result.persisted);
    }

    #[tokio::test]
    async fn test_secondary_persistence_failure_is_kept() {
        let h = Harness::new(
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::failing("rejected"),
            RecordingRegistry::failing("disk full"),
        );
        let result = h
            .orchestrator()
            .run_workflow(&ExecutionContext::new(), &start_config(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::DecentralizeFailed);
        assert_eq!(result.secondary_errors.len(), 1);
        assert_eq!(result.secondary_errors[0].kind(), ErrorKind::PersistenceFailure);
    }

    #[tokio::test]
    async fn test_standalone_decentralize_never_touches_registry() {
        let h = Harness::happy();
        let result = h
            .orchestrator()
            .run_decentralize(&ExecutionContext::new(), &icon_flags())
            .await;

        assert!(result.is_ok());
        assert_eq!(result.final_state, WorkflowState::Done);
        assert_eq!(h.provisioner.calls(), 0);
        assert!(h.registry.persist_calls().is_empty());
        assert!(!result.visited(WorkflowState::Persisting));
        assert_eq!(h.executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_standalone_failure_is_fatal() {
        let h = Harness::new(
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::failing("bad password"),
            RecordingRegistry::new(),
        );
        let result = h
            .orchestrator()
            .run_decentralize(&ExecutionContext::new(), &icon_flags())
            .await;

        assert_eq!(result.status, WorkflowStatus::DecentralizeFailed);
        assert_eq!(
            result.final_state,
            WorkflowState::Failed(ErrorKind::DecentralizationFailure)
        );
    }

    #[tokio::test]
    async fn test_each_empty_flag_is_rejected_before_executor() {
        let h = Harness::happy();
        let orchestrator = h.orchestrator();

        let blanks: [fn(&mut DecentralizeConfig); 5] = [
            |c| c.service_name.clear(),
            |c| c.node_endpoint.clear(),
            |c| c.keystore_path.clear(),
            |c| c.key_password.clear(),
            |c| c.network_id.clear(),
        ];
        for blank in blanks {
            let mut flags = icon_flags();
            blank(&mut flags);
            let result = orchestrator
                .run_decentralize(&ExecutionContext::new(), &flags)
                .await;
            assert_eq!(result.error_kind(), Some(ErrorKind::ValidationFailure));
            assert_eq!(result.failed_phase, Some(Phase::BuildParams));
            assert!(!result.visited(WorkflowState::Decentralizing));
        }
        assert_eq!(h.executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_hung_provisioner() {
        let h = Harness::new(
            StubProvisioner::hanging(),
            StubExecutor::succeeding(),
            RecordingRegistry::new(),
        );
        let ctx = ExecutionContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = h.orchestrator().run_workflow(&ctx, &start_config(true)).await;
        assert_eq!(
            result.error,
            Some(WorkflowError::Cancelled {
                phase: Phase::Provision
            })
        );
        assert_eq!(result.status, WorkflowStatus::ProvisionFailed);
        assert_eq!(result.final_state, WorkflowState::Failed(ErrorKind::Cancelled));
        assert!(h.registry.persist_calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_decentralization_still_persists() {
        let h = Harness::new(
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::hanging(),
            RecordingRegistry::new(),
        );
        let ctx = ExecutionContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = h.orchestrator().run_workflow(&ctx, &start_config(true)).await;
        assert_eq!(result.status, WorkflowStatus::DecentralizeFailed);
        assert!(result.error.as_ref().unwrap().is_cancelled());
        assert!(result.persisted);
    }

    #[tokio::test]
    async fn test_progress_brackets_sandbox_calls() {
        let h = Harness::happy();
        let progress = Arc::new(RecordingProgress::default());
        let orchestrator = h.orchestrator().with_progress(progress.clone());
        orchestrator
            .run_workflow(&ExecutionContext::new(), &start_config(true))
            .await;

        assert_eq!(
            progress.messages(),
            vec![
                "start: Starting ICON node".to_string(),
                "stop: ICON node started".to_string(),
                "start: Decentralizing icon-1".to_string(),
                "stop: icon-1 decentralized".to_string(),
            ]
        );
    }
}
