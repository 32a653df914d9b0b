//! Startup-time registry of saga factories, keyed by saga kind.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::error::{Result, SagaError, panic_message};
use crate::saga::Saga;

type Factory<D, R> = Arc<dyn Fn() -> Result<Saga<D, R>> + Send + Sync>;

struct Registration {
    payload: &'static str,
    result: &'static str,
    factory: Box<dyn Any + Send + Sync>,
}

/// Maps saga kinds to the factories that build them.
///
/// Each kind is bound to one payload type and one result type. The
/// registry is filled once at startup and then shared read-only.
#[derive(Default)]
pub struct SagaRegistry {
    sagas: HashMap<String, Registration>,
}

impl SagaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::DuplicateKind` if `kind` is already registered.
    pub fn register<D, R, F>(&mut self, kind: impl Into<String>, factory: F) -> Result<()>
    where
        D: Send + 'static,
        R: Send + 'static,
        F: Fn() -> Result<Saga<D, R>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.sagas.contains_key(&kind) {
            return Err(SagaError::DuplicateKind(kind));
        }

        let factory: Factory<D, R> = Arc::new(factory);
        tracing::debug!(
            saga = %kind,
            payload = type_name::<D>(),
            result = type_name::<R>(),
            "registered saga"
        );
        self.sagas.insert(
            kind,
            Registration {
                payload: type_name::<D>(),
                result: type_name::<R>(),
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    /// Registers an already built saga; each resolution hands out a clone.
    ///
    /// # Errors
    ///
    /// Returns `SagaError::DuplicateKind` if `kind` is already registered.
    pub fn register_saga<D, R>(&mut self, kind: impl Into<String>, saga: Saga<D, R>) -> Result<()>
    where
        D: Send + 'static,
        R: Send + 'static,
    {
        self.register(kind, move || Ok(saga.clone()))
    }

    /// Returns true if `kind` is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.sagas.contains_key(kind)
    }

    /// Returns the registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.sagas.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Builds the saga registered under `kind`.
    ///
    /// # Errors
    ///
    /// - `SagaError::UnknownKind` if nothing is registered under `kind`.
    /// - `SagaError::TypeMismatch` if the registered saga uses other types.
    /// - `SagaError::Construction` if the factory fails or panics.
    pub fn resolve<D, R>(&self, kind: &str) -> Result<Saga<D, R>>
    where
        D: Send + 'static,
        R: Send + 'static,
    {
        let registration = self
            .sagas
            .get(kind)
            .ok_or_else(|| SagaError::UnknownKind(kind.to_string()))?;

        let factory = registration
            .factory
            .downcast_ref::<Factory<D, R>>()
            .ok_or_else(|| {
                tracing::debug!(
                    saga = kind,
                    registered_payload = registration.payload,
                    registered_result = registration.result,
                    "saga requested with mismatched types"
                );
                SagaError::TypeMismatch {
                    kind: kind.to_string(),
                    payload: type_name::<D>(),
                    result: type_name::<R>(),
                }
            })?;

        match std::panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(saga)) => Ok(saga),
            Ok(Err(err)) => Err(SagaError::Construction {
                kind: kind.to_string(),
                reason: err.to_string(),
            }),
            Err(panic) => Err(SagaError::Construction {
                kind: kind.to_string(),
                reason: panic_message(panic),
            }),
        }
    }
}

impl std::fmt::Debug for SagaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
