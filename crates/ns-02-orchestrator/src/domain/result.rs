//! # Workflow Results
//!
//! `WorkflowResult` is what a run hands back to its caller. `RunRecorder`
//! accumulates it while the run progresses.

use std::fmt;

use serde::Serialize;
use shared_types::{ErrorKind, Phase, ServiceDescriptor, WorkflowError};
use uuid::Uuid;

use super::state::{StateMachine, WorkflowState};

/// Overall outcome of a run, named after the phase that failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStatus {
    Ok,
    ProvisionFailed,
    DecentralizeFailed,
    PersistFailed,
}

impl WorkflowStatus {
    fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Provision => Self::ProvisionFailed,
            Phase::BuildParams | Phase::Decentralize => Self::DecentralizeFailed,
            Phase::Persist => Self::PersistFailed,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ProvisionFailed => "provision-failed",
            Self::DecentralizeFailed => "decentralize-failed",
            Self::PersistFailed => "persist-failed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one workflow invocation.
#[derive(Debug, Clone)]
pub struct WorkflowResult {
    /// Correlation id shared by every log line of the run.
    pub run_id: Uuid,
    /// Descriptor of the provisioned node, if provisioning succeeded.
    pub descriptor: Option<ServiceDescriptor>,
    pub status: WorkflowStatus,
    /// The originating failure.
    pub error: Option<WorkflowError>,
    /// Phase in which `error` occurred.
    pub failed_phase: Option<Phase>,
    /// Failures after the originating one (e.g. persistence after a
    /// decentralization failure).
    pub secondary_errors: Vec<WorkflowError>,
    /// Whether the descriptor reached the registry.
    pub persisted: bool,
    pub final_state: WorkflowState,
    /// Every state visited, starting with `Init`.
    pub transitions: Vec<WorkflowState>,
}

impl WorkflowResult {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == WorkflowStatus::Ok
    }

    /// Kind of the originating failure, if any.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(WorkflowError::kind)
    }

    /// Whether the run passed through `state`.
    #[must_use]
    pub fn visited(&self, state: WorkflowState) -> bool {
        self.transitions.contains(&state)
    }
}

/// Collects state, failures and output while a run is in flight.
#[derive(Debug)]
pub(crate) struct RunRecorder {
    run_id: Uuid,
    machine: StateMachine,
    failures: Vec<(Phase, WorkflowError)>,
    descriptor: Option<ServiceDescriptor>,
    persisted: bool,
}

impl RunRecorder {
    pub(crate) fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            machine: StateMachine::new(),
            failures: Vec::new(),
            descriptor: None,
            persisted: false,
        }
    }

    pub(crate) fn advance(&mut self, next: WorkflowState) {
        tracing::debug!(
            run_id = %self.run_id,
            from = %self.machine.current(),
            to = %next,
            "Workflow transition"
        );
        self.machine.advance(next);
    }

    /// Record a failure and log it with its stable code.
    pub(crate) fn fail(&mut self, phase: Phase, error: WorkflowError) {
        let kind = error.kind();
        ns_telemetry::log_event!(
            error,
            phase,
            "Workflow phase failed",
            run_id = %self.run_id,
            code = error.code(),
            kind = %kind,
            error = %error
        );
        self.failures.push((phase, error));
    }

    pub(crate) fn set_descriptor(&mut self, descriptor: ServiceDescriptor) {
        self.descriptor = Some(descriptor);
    }

    pub(crate) fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Enter the terminal state and build the result.
    pub(crate) fn finish(mut self) -> WorkflowResult {
        let mut failures = self.failures.into_iter();
        let originating = failures.next();
        let secondary_errors = failures.map(|(_, error)| error).collect();

        let (status, final_state) = match &originating {
            Some((phase, error)) => (
                WorkflowStatus::for_phase(*phase),
                WorkflowState::Failed(error.kind()),
            ),
            None => (WorkflowStatus::Ok, WorkflowState::Done),
        };
        self.machine.advance(final_state);

        let (failed_phase, error) = match originating {
            Some((phase, error)) => (Some(phase), Some(error)),
            None => (None, None),
        };

        WorkflowResult {
            run_id: self.run_id,
            descriptor: self.descriptor,
            status,
            error,
            failed_phase,
            secondary_errors,
            persisted: self.persisted,
            final_state,
            transitions: self.machine.into_history(),
        }
    }
}
