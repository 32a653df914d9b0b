//! Saga coordinator: resolves a saga by kind and runs it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::error::{SagaError, panic_message};
use crate::outcome::Outcome;
use crate::registry::SagaRegistry;
use crate::report::SagaReport;

/// Message returned when a saga panics outside of any step.
const GENERIC_SAGA_FAILURE: &str = "An error occurred during the saga";

/// Runs registered sagas and turns every error into an [`Outcome`].
///
/// The coordinator is the outermost boundary of the engine: whatever
/// happens inside (unknown kind, failing factory, faulting or panicking
/// step), callers of [`run`](Self::run) get back a single `Outcome` and
/// never an error or a panic. It does not retry.
#[derive(Debug, Clone)]
pub struct SagaCoordinator {
    registry: Arc<SagaRegistry>,
}

impl SagaCoordinator {
    /// Creates a coordinator over a fully populated registry.
    pub fn new(registry: SagaRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Returns the registry this coordinator resolves from.
    pub fn registry(&self) -> &SagaRegistry {
        &self.registry
    }

    /// Runs the saga registered under `kind` against `data`.
    ///
    /// `data` is borrowed mutably for the whole run, so no other execution
    /// can observe or share it; identifiers written by steps are visible to
    /// the caller afterwards.
    pub async fn run<D, R>(&self, kind: &str, data: &mut D) -> Outcome<R>
    where
        D: Send + 'static,
        R: Send + 'static,
    {
        let (outcome, _report) = self.run_with_report(kind, data).await;
        outcome
    }

    /// Like [`run`](Self::run), also returning the execution report.
    ///
    /// The report is `None` when the saga could not be resolved or panicked
    /// outside of a step.
    #[tracing::instrument(skip(self, data))]
    pub async fn run_with_report<D, R>(
        &self,
        kind: &str,
        data: &mut D,
    ) -> (Outcome<R>, Option<SagaReport>)
    where
        D: Send + 'static,
        R: Send + 'static,
    {
        tracing::info!("starting saga");

        let saga = match self.registry.resolve::<D, R>(kind) {
            Ok(saga) => saga,
            Err(err) => {
                metrics::counter!("saga_resolution_failures_total").increment(1);
                tracing::error!(error = %err, "saga resolution failed");
                return (to_failure(&err), None);
            }
        };

        let run = AssertUnwindSafe(saga.execute_with_report(data))
            .catch_unwind()
            .await;

        match run {
            Ok((Ok(outcome), report)) => {
                match &outcome {
                    Outcome::Success(_) => tracing::info!("saga completed successfully"),
                    Outcome::Failure(errors) => {
                        tracing::warn!(errors = %errors.join(", "), "saga failed");
                    }
                }
                (outcome, Some(report))
            }
            Ok((Err(err), report)) => {
                tracing::error!(error = %err, "saga faulted");
                (to_failure(&err), Some(report))
            }
            Err(panic) => {
                let err = SagaError::Panicked {
                    saga: kind.to_string(),
                    message: panic_message(panic),
                };
                tracing::error!(error = %err, "saga panicked");
                (to_failure(&err), None)
            }
        }
    }
}

/// Converts an engine error into a failure that is safe to show callers.
///
/// The message names the saga or step involved but never includes the
/// underlying error text; full detail goes to the logs.
pub fn to_failure<T>(err: &SagaError) -> Outcome<T> {
    let message = match err {
        SagaError::StepFault { step, .. } => format!("An error occurred in step {step}"),
        SagaError::UnknownKind(kind) => format!("Saga '{kind}' is not registered"),
        SagaError::DuplicateKind(kind) => format!("Saga '{kind}' is already registered"),
        SagaError::TypeMismatch { kind, .. } => format!("Saga '{kind}' cannot handle this request"),
        SagaError::Construction { kind, .. } => format!("Saga '{kind}' could not be started"),
        SagaError::EmptySaga { saga } => format!("Saga '{saga}' could not be started"),
        SagaError::Panicked { .. } => GENERIC_SAGA_FAILURE.to_string(),
    };
    Outcome::failure(message)
}
