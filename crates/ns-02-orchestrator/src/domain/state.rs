//! # Workflow State Machine
//!
//! States only move forward and each is entered at most once per run.

use std::fmt;

use shared_types::ErrorKind;

/// Position of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Init,
    Provisioning,
    Provisioned,
    BuildingParams,
    Decentralizing,
    Decentralized,
    Persisting,
    Done,
    Failed(ErrorKind),
}

impl WorkflowState {
    /// Ordering used to forbid backward transitions.
    fn rank(&self) -> u8 {
        match self {
            Self::Init => 0,
            Self::Provisioning => 1,
            Self::Provisioned => 2,
            Self::BuildingParams => 3,
            Self::Decentralizing => 4,
            Self::Decentralized => 5,
            Self::Persisting => 6,
            Self::Done | Self::Failed(_) => 7,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed(_))
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => f.write_str("init"),
            Self::Provisioning => f.write_str("provisioning"),
            Self::Provisioned => f.write_str("provisioned"),
            Self::BuildingParams => f.write_str("building-params"),
            Self::Decentralizing => f.write_str("decentralizing"),
            Self::Decentralized => f.write_str("decentralized"),
            Self::Persisting => f.write_str("persisting"),
            Self::Done => f.write_str("done"),
            Self::Failed(kind) => write!(f, "failed({kind})"),
        }
    }
}

/// Forward-only transition guard with a history of visited states.
#[derive(Debug, Clone)]
pub(crate) struct StateMachine {
    current: WorkflowState,
    history: Vec<WorkflowState>,
}

impl StateMachine {
    pub(crate) fn new() -> Self {
        Self {
            current: WorkflowState::Init,
            history: vec![WorkflowState::Init],
        }
    }

    pub(crate) fn current(&self) -> WorkflowState {
        self.current
    }

    /// Move to `next`.
    ///
    /// # Panics
    /// In debug builds, if `next` is not strictly after the current state or
    /// the machine is already terminal. Release builds ignore the transition.
    pub(crate) fn advance(&mut self, next: WorkflowState) {
        let allowed = !self.current.is_terminal() && next.rank() > self.current.rank();
        debug_assert!(allowed, "illegal transition {} -> {}", self.current, next);
        if !allowed {
            tracing::error!(
                from = %self.current,
                to = %next,
                "Ignoring illegal workflow transition"
            );
            return;
        }
        self.current = next;
        self.history.push(next);
    }

    pub(crate) fn into_history(self) -> Vec<WorkflowState> {
        self.history
    }
}
