//! Workflow state machine.

use serde::{Deserialize, Serialize};

/// The status of a workflow in its lifecycle.
///
/// Status transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WorkflowStatus {
    /// Workflow has not started yet.
    #[default]
    NotStarted,

    /// Steps are being executed.
    Running,

    /// A step failed and completed steps are being compensated.
    Compensating,

    /// All steps completed successfully (terminal state).
    Completed,

    /// A step failed; compensation ran, successfully or not (terminal state).
    Failed,
}

impl WorkflowStatus {
    /// Returns true if the workflow can begin running.
    pub fn can_run(&self) -> bool {
        matches!(self, WorkflowStatus::NotStarted)
    }

    /// Returns true if the workflow can begin compensation.
    pub fn can_compensate(&self) -> bool {
        matches!(self, WorkflowStatus::Running)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::NotStarted => "NotStarted",
            WorkflowStatus::Running => "Running",
            WorkflowStatus::Compensating => "Compensating",
            WorkflowStatus::Completed => "Completed",
            WorkflowStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
