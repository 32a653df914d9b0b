//! HTTP gateway for user provisioning.
//!
//! Exposes the provisioning sagas over REST, with structured logging
//! (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use provisioning::Services;
use provisioning::services::{
    InMemoryIdentityService, InMemoryOrganisationService, InMemoryPatientService,
};
use saga::{SagaCoordinator, SagaError, SagaRegistry};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::users::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/gateway/users/staff", post(routes::users::create_staff))
        .route(
            "/api/gateway/users/patient",
            post(routes::users::create_patient),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Registers every provisioning saga over `services` and builds the state.
pub fn create_state(services: &Services) -> Result<Arc<AppState>, SagaError> {
    let mut registry = SagaRegistry::new();
    provisioning::register_sagas(&mut registry, services)?;
    Ok(Arc::new(AppState {
        coordinator: SagaCoordinator::new(registry),
    }))
}

/// Handles to the in-memory services behind [`create_in_memory_state`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryServices {
    pub identity: InMemoryIdentityService,
    pub organisation: InMemoryOrganisationService,
    pub patient: InMemoryPatientService,
}

/// Creates application state backed by in-memory downstream services.
pub fn create_in_memory_state(
    services: &InMemoryServices,
) -> Result<Arc<AppState>, SagaError> {
    create_state(&Services::in_memory(
        services.identity.clone(),
        services.organisation.clone(),
        services.patient.clone(),
    ))
}
