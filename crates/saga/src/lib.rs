//! Saga orchestration engine.
//!
//! A saga is an ordered list of reversible steps over a shared mutable
//! payload. Steps run in declaration order; if one fails, the steps that
//! already completed are compensated in reverse order and the original
//! failure is returned.
//!
//! - [`Outcome`] is the success/failure type every operation returns.
//! - [`SagaStep`] is the contract business code implements.
//! - [`Saga`] executes steps and drives compensation.
//! - [`SagaRegistry`] maps saga kinds to factories at startup.
//! - [`SagaCoordinator`] resolves and runs sagas, folding every error into
//!   an `Outcome` so nothing escapes to the caller.

pub mod coordinator;
pub mod error;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod saga;
pub mod state;
pub mod step;

pub use coordinator::{SagaCoordinator, to_failure};
pub use error::{SagaError, StepFault};
pub use outcome::Outcome;
pub use registry::SagaRegistry;
pub use report::{SagaReport, StepRecord, StepStatus};
pub use saga::{Saga, SagaBuilder};
pub use state::SagaState;
pub use step::SagaStep;
