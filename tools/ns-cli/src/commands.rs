//! Command dispatch: wires the sandbox client and the registry into a
//! `WorkflowOrchestrator` and turns its result into an exit code.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ns_01_service_registry::{JsonFileRegistry, ServiceRegistry};
use ns_02_orchestrator::{
    DecentralizationExecutor, DecentralizeConfig, ExecutionContext, NodeProvisioner,
    RuntimeConfig, SandboxRpcClient, WorkflowOrchestrator, WorkflowResult,
};
use ns_telemetry::log_event;
use shared_types::{ErrorKind, Phase};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::{Cli, Command, IconAction};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FAILED: u8 = 1;
/// Exit status of a run interrupted with Ctrl-C.
pub const EXIT_CANCELLED: u8 = 130;

/// Apply command-line overrides on top of environment configuration.
pub fn runtime_config(cli: &Cli) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::from_env();
    if let Some(endpoint) = &cli.sandbox_endpoint {
        config.sandbox_endpoint = endpoint.clone();
    }
    if let Some(path) = &cli.registry {
        config.registry_path = path.clone();
    }
    config.validate().context("invalid runtime configuration")?;
    Ok(config)
}

pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<u8> {
    let runtime = runtime_config(&cli)?;
    let client = Arc::new(
        SandboxRpcClient::new(&runtime).context("failed to create sandbox client")?,
    );
    let registry = JsonFileRegistry::new(&runtime.registry_path);
    info!(
        sandbox = %client.base_url(),
        registry = %registry.path().display(),
        "nsbox starting"
    );

    let orchestrator = WorkflowOrchestrator::new(client.clone(), client, registry);
    let ctx = ExecutionContext::with_token(cancel);

    Ok(execute(&orchestrator, &ctx, cli.command, &runtime.registry_path).await)
}

/// Run `command` on `orchestrator` and return the process exit status.
pub async fn execute<P, D, R>(
    orchestrator: &WorkflowOrchestrator<P, D, R>,
    ctx: &ExecutionContext,
    command: Command,
    registry_path: &Path,
) -> u8
where
    P: NodeProvisioner,
    D: DecentralizationExecutor,
    R: ServiceRegistry,
{
    let Command::Icon(args) = command;
    match args.action {
        Some(IconAction::Decentralize(flags)) => {
            let config = DecentralizeConfig::from(flags);
            let result = orchestrator.run_decentralize(ctx, &config).await;
            if result.is_ok() {
                println!("{} decentralization completed", config.service_name);
            }
            report(&result, Phase::Decentralize)
        }
        None => {
            let result = orchestrator.run_workflow(ctx, &args.workflow_config()).await;
            if let Some(descriptor) = result.descriptor.as_ref().filter(|_| result.persisted) {
                println!(
                    "{} recorded in {}",
                    descriptor.service_name(),
                    registry_path.display()
                );
            }
            report(&result, Phase::Persist)
        }
    }
}

/// Log the outcome and pick the exit status. `last_phase` is the phase a
/// successful run ends in.
fn report(result: &WorkflowResult, last_phase: Phase) -> u8 {
    match &result.error {
        None => {
            log_event!(
                info,
                last_phase,
                "Workflow finished",
                run_id = %result.run_id,
                status = %result.status
            );
            EXIT_OK
        }
        Some(error) => {
            let phase = result.failed_phase.unwrap_or(Phase::Provision);
            log_event!(
                error,
                phase,
                "Workflow failed",
                run_id = %result.run_id,
                status = %result.status,
                code = error.code(),
                error = %error
            );
            for secondary in &result.secondary_errors {
                log_event!(
                    warn,
                    phase,
                    "Additional failure",
                    run_id = %result.run_id,
                    code = secondary.code(),
                    error = %secondary
                );
            }
            if error.kind() == ErrorKind::Cancelled {
                EXIT_CANCELLED
            } else {
                EXIT_FAILED
            }
        }
    }
}
