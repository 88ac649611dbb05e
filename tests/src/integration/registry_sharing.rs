//! # Registry Sharing
//!
//! Parallel workflow runs that share one `services.json`.

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use ns_01_service_registry::{JsonFileRegistry, ServiceRegistry};
    use ns_02_orchestrator::test_utils::{StubExecutor, StubProvisioner};
    use ns_02_orchestrator::{ExecutionContext, WorkflowConfig, WorkflowOrchestrator};
    use shared_types::ServiceDescriptor;

    fn node(index: usize) -> ServiceDescriptor {
        ServiceDescriptor::new(
            format!("icon-{index}"),
            format!("http://node-{index}:9000"),
            format!("/ks/icon-{index}.json"),
            "pw",
            "0x3",
        )
        .unwrap()
    }

    async fn start_node(path: PathBuf, index: usize) -> bool {
        let orchestrator = WorkflowOrchestrator::new(
            StubProvisioner::succeeding(node(index)),
            StubExecutor::succeeding(),
            JsonFileRegistry::new(path),
        );
        let config = WorkflowConfig {
            decentralize: true,
            ..WorkflowConfig::default()
        };
        orchestrator
            .run_workflow(&ExecutionContext::new(), &config)
            .await
            .is_ok()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_runs_on_distinct_nodes_all_land() {
        const RUNS: usize = 16;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");

        let handles: Vec<_> = (0..RUNS)
            .map(|i| tokio::spawn(start_node(path.clone(), i)))
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let stored = JsonFileRegistry::new(&path).list().unwrap();
        assert_eq!(stored.len(), RUNS);
        for i in 0..RUNS {
            assert!(stored.contains(&node(i)), "icon-{i} missing");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_same_node_written_in_parallel_stays_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("services.json");

        let a = tokio::spawn(start_node(path.clone(), 7));
        let b = tokio::spawn(start_node(path.clone(), 7));
        assert!(a.await.unwrap());
        assert!(b.await.unwrap());

        let registry = JsonFileRegistry::new(&path);
        assert_eq!(registry.get("icon-7").unwrap(), Some(node(7)));
        assert_eq!(registry.list().unwrap().len(), 1);
    }
}
