//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::users::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Saga kinds this gateway can run.
    pub sagas: Vec<String>,
}

/// GET /health: liveness plus the registered saga kinds.
pub async fn check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sagas = state
        .coordinator
        .registry()
        .kinds()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(HealthResponse {
        status: "ok",
        sagas,
    })
}
