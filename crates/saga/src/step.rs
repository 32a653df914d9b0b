//! The step contract.

use async_trait::async_trait;

use crate::error::StepFault;
use crate::outcome::Outcome;

/// One reversible unit of work inside a saga.
///
/// A step operates on the saga's payload `D`, which is owned by exactly one
/// execution at a time. Steps must not keep per-execution state on `self`:
/// anything `compensate` needs (typically the identifier of a resource that
/// `execute` created) is written into the payload. This keeps one step
/// instance safe to share between concurrent executions.
///
/// Return conventions:
/// - `Ok(Outcome::Success(_))`: the step completed and will be compensated
///   if a later step fails.
/// - `Ok(Outcome::Failure(_))`: an expected rejection; the saga rolls back
///   and returns this failure to the caller.
/// - `Err(StepFault)`: an unexpected error; the saga rolls back and the
///   caller sees a generic failure message.
#[async_trait]
pub trait SagaStep<D, R>: Send + Sync
where
    D: Send,
{
    /// Stable name used in logs, metrics and reports.
    fn name(&self) -> &'static str;

    /// Performs the forward action.
    async fn execute(&self, data: &mut D) -> Result<Outcome<R>, StepFault>;

    /// Undoes the effect of a successful `execute` on the same payload.
    ///
    /// Must succeed without side effects when there is nothing to undo.
    /// The default implementation is a no-op, suitable for read-only steps.
    async fn compensate(&self, data: &mut D) -> Result<Outcome<()>, StepFault> {
        let _ = data;
        Ok(Outcome::unit())
    }
}
