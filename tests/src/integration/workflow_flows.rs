//! # Workflow Flows
//!
//! Start and decentralize runs against a real `services.json` in a temp dir,
//! with stubbed sandbox collaborators.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, Instant};

    use ns_01_service_registry::adapters::lock::RegistryLock;
    use ns_01_service_registry::{JsonFileRegistry, ServiceRegistry};
    use ns_02_orchestrator::test_utils::{icon_descriptor, StubExecutor, StubProvisioner};
    use ns_02_orchestrator::{
        DecentralizeConfig, ExecutionContext, WorkflowConfig, WorkflowOrchestrator,
        WorkflowState, WorkflowStatus,
    };
    use serde_json::{json, Value};
    use shared_types::{ErrorKind, ServiceDescriptor};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn orchestrator(
        dir: &Path,
        provisioner: StubProvisioner,
        executor: StubExecutor,
    ) -> WorkflowOrchestrator<StubProvisioner, StubExecutor, JsonFileRegistry> {
        WorkflowOrchestrator::new(provisioner, executor, JsonFileRegistry::in_dir(dir))
    }

    fn start(decentralize: bool) -> WorkflowConfig {
        WorkflowConfig {
            decentralize,
            ..WorkflowConfig::default()
        }
    }

    fn read_document(dir: &Path) -> Value {
        let bytes = fs::read(dir.join("services.json")).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn icon_record() -> Value {
        json!({
            "serviceName": "icon-1",
            "endpoint": "http://node:9000",
            "keystorePath": "/ks/icon-1.json",
            "keyPassword": "pw",
            "networkId": "0x3"
        })
    }

    // =============================================================================
    // START FLOW
    // =============================================================================

    #[tokio::test]
    async fn test_icon_start_and_decentralize_writes_record() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            dir.path(),
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::succeeding(),
        );

        let result = orchestrator
            .run_workflow(&ExecutionContext::new(), &start(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::Ok);
        assert_eq!(read_document(dir.path()), json!({ "icon-1": icon_record() }));
        assert_eq!(orchestrator.registry().list().unwrap(), vec![icon_descriptor()]);
    }

    #[tokio::test]
    async fn test_failed_decentralization_still_records_node() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            dir.path(),
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::failing("network unreachable"),
        );

        let result = orchestrator
            .run_workflow(&ExecutionContext::new(), &start(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::DecentralizeFailed);
        assert_eq!(result.error.as_ref().map(|e| e.code()), Some(1003));
        assert_eq!(read_document(dir.path())["icon-1"], icon_record());
        assert_eq!(orchestrator.executor().calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_provisioning_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            dir.path(),
            StubProvisioner::failing("sandbox unavailable"),
            StubExecutor::succeeding(),
        );

        let result = orchestrator
            .run_workflow(&ExecutionContext::new(), &start(true))
            .await;

        assert_eq!(result.status, WorkflowStatus::ProvisionFailed);
        assert_eq!(
            result.final_state,
            WorkflowState::Failed(ErrorKind::ProvisionFailure)
        );
        assert!(!dir.path().join("services.json").exists());
    }

    #[tokio::test]
    async fn test_repeated_start_is_idempotent_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            dir.path(),
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::succeeding(),
        );

        orchestrator
            .run_workflow(&ExecutionContext::new(), &start(false))
            .await;
        let once = fs::read(dir.path().join("services.json")).unwrap();
        orchestrator
            .run_workflow(&ExecutionContext::new(), &start(false))
            .await;
        let twice = fs::read(dir.path().join("services.json")).unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_start_keeps_records_written_by_other_tools() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("services.json"),
            r#"{"legacy-node":{"endpoint":"http://old:9000","keystorePath":"/ks/old.json",
                "keyPassword":"old","networkId":"0x1"}}"#,
        )
        .unwrap();
        let orchestrator = orchestrator(
            dir.path(),
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::succeeding(),
        );

        let result = orchestrator
            .run_workflow(&ExecutionContext::new(), &start(false))
            .await;
        assert!(result.is_ok());

        let document = read_document(dir.path());
        assert_eq!(document["legacy-node"]["endpoint"], "http://old:9000");
        assert_eq!(document["icon-1"], icon_record());

        let legacy = orchestrator.registry().get("legacy-node").unwrap().unwrap();
        assert_eq!(legacy.service_name(), "legacy-node");
    }

    #[tokio::test]
    async fn test_reprovisioned_node_supersedes_record() {
        let dir = tempfile::tempdir().unwrap();
        let first = orchestrator(
            dir.path(),
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::succeeding(),
        );
        first.run_workflow(&ExecutionContext::new(), &start(false)).await;

        let moved =
            ServiceDescriptor::new("icon-1", "http://node:9100", "/ks/icon-1.json", "pw", "0x3")
                .unwrap();
        let second = orchestrator(
            dir.path(),
            StubProvisioner::succeeding(moved.clone()),
            StubExecutor::succeeding(),
        );
        second.run_workflow(&ExecutionContext::new(), &start(false)).await;

        assert_eq!(second.registry().get("icon-1").unwrap(), Some(moved));
        assert_eq!(read_document(dir.path()).as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_registry_locked_by_another_tool_fails_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let registry =
            JsonFileRegistry::in_dir(dir.path()).with_lock_timeout(Duration::from_millis(200));
        let held = RegistryLock::acquire(registry.path()).unwrap();
        let orchestrator = WorkflowOrchestrator::new(
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::succeeding(),
            registry,
        );

        let started = Instant::now();
        let result = orchestrator
            .run_workflow(&ExecutionContext::new(), &start(true))
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.status, WorkflowStatus::PersistFailed);
        assert_eq!(result.error.as_ref().map(|e| e.code()), Some(1004));
        assert!(!result.persisted);
        assert!(!dir.path().join("services.json").exists());
        drop(held);
    }

    // =============================================================================
    // DECENTRALIZE-EXISTING FLOW
    // =============================================================================

    #[tokio::test]
    async fn test_standalone_decentralize_does_not_write_registry() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            dir.path(),
            StubProvisioner::succeeding(icon_descriptor()),
            StubExecutor::succeeding(),
        );
        let flags = DecentralizeConfig {
            service_name: "icon-1".into(),
            node_endpoint: "http://node:9000".into(),
            keystore_path: "/ks/icon-1.json".into(),
            key_password: "pw".into(),
            network_id: "0x3".into(),
        };

        let result = orchestrator
            .run_decentralize(&ExecutionContext::new(), &flags)
            .await;

        assert_eq!(result.final_state, WorkflowState::Done);
        assert!(!result.persisted);
        assert!(!dir.path().join("services.json").exists());
    }
}
