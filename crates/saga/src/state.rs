//! Saga execution state machine.

use serde::{Deserialize, Serialize};

/// The state of one saga execution.
///
/// State transitions:
/// ```text
/// Pending ──► Running ──┬──► Completed
///                       └──► RollingBack ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// The execution has not started yet.
    #[default]
    Pending,

    /// Steps are being executed in declaration order.
    Running,

    /// A step failed and completed steps are being compensated.
    RollingBack,

    /// All steps completed successfully (terminal state).
    Completed,

    /// Rollback finished after a failure (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if an execution in this state may move to `next`.
    pub fn can_transition_to(self, next: SagaState) -> bool {
        matches!(
            (self, next),
            (SagaState::Pending, SagaState::Running)
                | (SagaState::Running, SagaState::Completed)
                | (SagaState::Running, SagaState::RollingBack)
                | (SagaState::RollingBack, SagaState::Failed)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Completed | SagaState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Pending => "Pending",
            SagaState::Running => "Running",
            SagaState::RollingBack => "RollingBack",
            SagaState::Completed => "Completed",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
