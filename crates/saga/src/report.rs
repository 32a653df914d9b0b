//! Per-execution trace of what a saga did.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::SagaState;

/// What happened to a step at one point of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// `execute` returned a success.
    Completed,
    /// `execute` returned a business failure.
    Failed,
    /// `execute` raised a fault or panicked.
    Faulted,
    /// `compensate` returned a success.
    Compensated,
    /// `compensate` returned a business failure.
    CompensationFailed,
    /// `compensate` raised a fault or panicked.
    CompensationFaulted,
}

impl StepStatus {
    /// Returns true for statuses recorded during rollback.
    pub fn is_compensation(&self) -> bool {
        matches!(
            self,
            StepStatus::Compensated
                | StepStatus::CompensationFailed
                | StepStatus::CompensationFaulted
        )
    }
}

/// One entry in a [`SagaReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Position of the step in the saga's declaration order.
    pub index: usize,
    /// The step name.
    pub step: String,
    /// What happened.
    pub status: StepStatus,
    /// Failure messages or fault detail, if any.
    pub detail: Option<String>,
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
}

/// Ordered trace of one saga execution.
///
/// Entries are appended in the order things happened: forward steps first,
/// then compensations in reverse order. The report carries internal fault
/// detail and is meant for logs and operators, not for end users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SagaReport {
    saga: String,
    state: SagaState,
    records: Vec<StepRecord>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl SagaReport {
    pub(crate) fn new(saga: impl Into<String>) -> Self {
        Self {
            saga: saga.into(),
            state: SagaState::Pending,
            records: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn transition(&mut self, state: SagaState) {
        debug_assert!(
            self.state.can_transition_to(state),
            "illegal saga transition {} -> {}",
            self.state,
            state
        );
        self.state = state;
        if state.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }

    pub(crate) fn record(
        &mut self,
        index: usize,
        step: &str,
        status: StepStatus,
        detail: Option<String>,
    ) {
        self.records.push(StepRecord {
            index,
            step: step.to_string(),
            status,
            detail,
            at: Utc::now(),
        });
    }

    /// Returns the saga name.
    pub fn saga(&self) -> &str {
        &self.saga
    }

    /// Returns the state the execution ended in.
    pub fn state(&self) -> SagaState {
        self.state
    }

    /// Returns every entry in the order it was recorded.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Returns when the execution started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns when the execution reached a terminal state.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Names of the steps whose `execute` succeeded, in execution order.
    pub fn completed_steps(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.status == StepStatus::Completed)
            .map(|r| r.step.as_str())
            .collect()
    }

    /// Names of the steps that went through `compensate`, in rollback order.
    pub fn compensated_steps(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.status.is_compensation())
            .map(|r| r.step.as_str())
            .collect()
    }

    /// The step whose `execute` triggered the rollback, if any.
    pub fn failed_step(&self) -> Option<&str> {
        self.records
            .iter()
            .find(|r| matches!(r.status, StepStatus::Failed | StepStatus::Faulted))
            .map(|r| r.step.as_str())
    }

    /// Compensations that did not succeed.
    pub fn compensation_failures(&self) -> Vec<&StepRecord> {
        self.records
            .iter()
            .filter(|r| {
                matches!(
                    r.status,
                    StepStatus::CompensationFailed | StepStatus::CompensationFaulted
                )
            })
            .collect()
    }

    /// Returns true if the execution failed and every compensation succeeded.
    pub fn rolled_back_cleanly(&self) -> bool {
        self.state == SagaState::Failed && self.compensation_failures().is_empty()
    }
}
