//! Forward-then-compensate saga executor.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;

use crate::error::{Result, SagaError, StepFault, panic_message};
use crate::outcome::Outcome;
use crate::report::{SagaReport, StepStatus};
use crate::state::SagaState;
use crate::step::SagaStep;

/// An ordered, fixed list of steps over payload `D` producing `R`.
///
/// Steps run strictly in declaration order. When a step fails or faults,
/// the steps that already completed are compensated in reverse order and
/// the triggering failure is returned. The saga's result is the result of
/// its last step; values from earlier steps travel through the payload.
///
/// A `Saga` holds no per-execution state and can be cloned cheaply and run
/// concurrently, each execution with its own payload.
pub struct Saga<D: Send, R> {
    name: String,
    steps: Vec<Arc<dyn SagaStep<D, R>>>,
}

impl<D: Send, R> Clone for Saga<D, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            steps: self.steps.clone(),
        }
    }
}

impl<D: Send, R> std::fmt::Debug for Saga<D, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saga")
            .field("name", &self.name)
            .field(
                "steps",
                &self.steps.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<D, R> Saga<D, R>
where
    D: Send + 'static,
    R: Send + 'static,
{
    /// Starts building a saga with the given name.
    pub fn builder(name: impl Into<String>) -> SagaBuilder<D, R> {
        SagaBuilder::new(name)
    }

    /// Creates a saga from already constructed steps.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::EmptySaga` if `steps` is empty.
    pub fn new(name: impl Into<String>, steps: Vec<Arc<dyn SagaStep<D, R>>>) -> Result<Self> {
        let name = name.into();
        if steps.is_empty() {
            return Err(SagaError::EmptySaga { saga: name });
        }
        Ok(Self { name, steps })
    }

    /// Returns the saga name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the step names in declaration order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs the saga against `data`.
    ///
    /// Returns `Ok` with the last step's outcome when every step succeeds,
    /// or with the failing step's outcome after rollback.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::StepFault` if a step raised a fault or panicked.
    /// Rollback has already run when this is returned.
    pub async fn execute(&self, data: &mut D) -> Result<Outcome<R>> {
        let (result, _report) = self.execute_with_report(data).await;
        result
    }

    /// Runs the saga and also returns a trace of every step and compensation.
    #[tracing::instrument(skip(self, data), fields(saga = %self.name))]
    pub async fn execute_with_report(&self, data: &mut D) -> (Result<Outcome<R>>, SagaReport) {
        let mut report = SagaReport::new(&self.name);
        report.transition(SagaState::Running);
        metrics::counter!("saga_executions_total", "saga" => self.name.clone()).increment(1);
        let started = Instant::now();

        let mut completed: Vec<usize> = Vec::with_capacity(self.steps.len());
        let mut last: Option<Outcome<R>> = None;

        for (index, step) in self.steps.iter().enumerate() {
            let step_name = step.name();
            tracing::info!(step = step_name, "executing saga step");

            let attempt = AssertUnwindSafe(step.execute(data))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(StepFault::Panicked(panic_message(panic))));

            match attempt {
                Ok(Outcome::Success(value)) => {
                    report.record(index, step_name, StepStatus::Completed, None);
                    completed.push(index);
                    last = Some(Outcome::Success(value));
                }
                Ok(Outcome::Failure(errors)) => {
                    let detail = errors.join(", ");
                    tracing::warn!(step = step_name, errors = %detail, "saga step failed");
                    report.record(index, step_name, StepStatus::Failed, Some(detail));

                    self.roll_back(&completed, data, &mut report).await;
                    self.finish_failed(&mut report, started);
                    return (Ok(Outcome::failures(errors)), report);
                }
                Err(fault) => {
                    tracing::error!(step = step_name, error = %fault, "saga step faulted");
                    report.record(
                        index,
                        step_name,
                        StepStatus::Faulted,
                        Some(fault.to_string()),
                    );

                    self.roll_back(&completed, data, &mut report).await;
                    self.finish_failed(&mut report, started);
                    let err = SagaError::StepFault {
                        step: step_name.to_string(),
                        source: fault,
                    };
                    return (Err(err), report);
                }
            }
        }

        report.transition(SagaState::Completed);
        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds", "saga" => self.name.clone()).record(duration);
        metrics::counter!("saga_completed", "saga" => self.name.clone()).increment(1);
        tracing::info!(duration, "saga completed successfully");

        let outcome = last.unwrap_or_else(|| Outcome::failure("No steps were executed"));
        (Ok(outcome), report)
    }

    /// Compensates the completed steps in reverse order.
    ///
    /// Every completed step is compensated even when an earlier
    /// compensation fails; failures are logged and recorded only.
    async fn roll_back(&self, completed: &[usize], data: &mut D, report: &mut SagaReport) {
        report.transition(SagaState::RollingBack);
        tracing::warn!(steps = completed.len(), "starting saga rollback");

        for &index in completed.iter().rev() {
            let step = &self.steps[index];
            let step_name = step.name();
            tracing::info!(step = step_name, "compensating saga step");
            metrics::counter!("saga_compensations_total", "saga" => self.name.clone())
                .increment(1);

            let attempt = AssertUnwindSafe(step.compensate(data))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(StepFault::Panicked(panic_message(panic))));

            match attempt {
                Ok(Outcome::Success(())) => {
                    report.record(index, step_name, StepStatus::Compensated, None);
                }
                Ok(Outcome::Failure(errors)) => {
                    let detail = errors.join(", ");
                    tracing::warn!(step = step_name, errors = %detail, "compensation failed");
                    metrics::counter!("saga_compensation_failures_total", "saga" => self.name.clone())
                        .increment(1);
                    report.record(index, step_name, StepStatus::CompensationFailed, Some(detail));
                }
                Err(fault) => {
                    tracing::error!(step = step_name, error = %fault, "compensation faulted");
                    metrics::counter!("saga_compensation_failures_total", "saga" => self.name.clone())
                        .increment(1);
                    report.record(
                        index,
                        step_name,
                        StepStatus::CompensationFaulted,
                        Some(fault.to_string()),
                    );
                }
            }
        }
    }

    fn finish_failed(&self, report: &mut SagaReport, started: Instant) {
        report.transition(SagaState::Failed);
        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("saga_duration_seconds", "saga" => self.name.clone()).record(duration);
        metrics::counter!("saga_failed", "saga" => self.name.clone()).increment(1);
        tracing::warn!(
            failed_step = report.failed_step().unwrap_or("unknown"),
            compensation_failures = report.compensation_failures().len(),
            "saga failed"
        );
    }
}

/// Builds a [`Saga`] step by step.
pub struct SagaBuilder<D: Send, R> {
    name: String,
    steps: Vec<Arc<dyn SagaStep<D, R>>>,
}

impl<D, R> SagaBuilder<D, R>
where
    D: Send + 'static,
    R: Send + 'static,
{
    /// Creates an empty builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    pub fn step<S>(mut self, step: S) -> Self
    where
        S: SagaStep<D, R> + 'static,
    {
        self.steps.push(Arc::new(step));
        self
    }

    /// Appends a step that is shared with other sagas.
    pub fn shared_step(mut self, step: Arc<dyn SagaStep<D, R>>) -> Self {
        self.steps.push(step);
        self
    }

    /// Finishes the saga.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::EmptySaga` if no step was added.
    pub fn build(self) -> Result<Saga<D, R>> {
        Saga::new(self.name, self.steps)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct Counter {
        value: i32,
        undone: Vec<&'static str>,
    }

    struct Add(&'static str, i32);

    #[async_trait]
    impl SagaStep<Counter, i32> for Add {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn execute(&self, data: &mut Counter) -> std::result::Result<Outcome<i32>, StepFault> {
            data.value += self.1;
            Ok(Outcome::success(data.value))
        }

        async fn compensate(
            &self,
            data: &mut Counter,
        ) -> std::result::Result<Outcome<()>, StepFault> {
            data.value -= self.1;
            data.undone.push(self.0);
            Ok(Outcome::unit())
        }
    }

    struct Reject;

    #[async_trait]
    impl SagaStep<Counter, i32> for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        async fn execute(&self, _data: &mut Counter) -> std::result::Result<Outcome<i32>, StepFault> {
            Ok(Outcome::failure("rejected"))
        }
    }

    #[test]
    fn test_empty_saga_is_rejected() {
        let result = SagaBuilder::<Counter, i32>::new("empty").build();
        assert!(matches!(result, Err(SagaError::EmptySaga { saga }) if saga == "empty"));
    }

    #[test]
    fn test_step_names_follow_declaration_order() {
        let saga = Saga::<Counter, i32>::builder("ordered")
            .step(Add("one", 1))
            .step(Add("two", 2))
            .step(Reject)
            .build()
            .unwrap();
        assert_eq!(saga.name(), "ordered");
        assert_eq!(saga.step_names(), vec!["one", "two", "reject"]);
        assert!(format!("{saga:?}").contains("\"two\""));
    }

    #[tokio::test]
    async fn test_last_step_result_is_returned() {
        let saga = Saga::<Counter, i32>::builder("sum")
            .step(Add("one", 1))
            .step(Add("ten", 10))
            .build()
            .unwrap();
        let mut data = Counter::default();

        let outcome = saga.execute(&mut data).await.unwrap();

        assert_eq!(outcome, Outcome::success(11));
        assert!(data.undone.is_empty());
    }

    #[tokio::test]
    async fn test_failure_restores_payload() {
        let saga = Saga::<Counter, i32>::builder("sum")
            .step(Add("one", 1))
            .step(Add("ten", 10))
            .step(Reject)
            .build()
            .unwrap();
        let mut data = Counter::default();

        let (result, report) = saga.execute_with_report(&mut data).await;

        assert_eq!(result.unwrap(), Outcome::failure("rejected"));
        assert_eq!(data.value, 0);
        assert_eq!(data.undone, vec!["ten", "one"]);
        assert_eq!(report.state(), SagaState::Failed);
        assert!(report.rolled_back_cleanly());
    }

    #[tokio::test]
    async fn test_clone_shares_steps() {
        let saga = Saga::<Counter, i32>::builder("sum").step(Add("one", 1)).build().unwrap();
        let copy = saga.clone();
        let mut data = Counter::default();

        copy.execute(&mut data).await.unwrap();
        saga.execute(&mut data).await.unwrap();

        assert_eq!(data.value, 2);
    }
}
