//! User provisioning endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use common::ResourceId;
use provisioning::{
    CREATE_PATIENT_WITH_USER, CREATE_USER_WITH_ROLE, PatientUserRequest, StaffUserRequest,
};
use saga::{Outcome, SagaCoordinator};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub coordinator: SagaCoordinator,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedResponse {
    pub user_id: String,
    pub message: String,
}

/// POST /api/gateway/users/staff: create a login account and staff member.
#[tracing::instrument(skip(state, req))]
pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    req: Result<Json<StaffUserRequest>, JsonRejection>,
) -> Result<Json<UserCreatedResponse>, ApiError> {
    let Json(mut req) = req?;
    tracing::info!(user_name = %req.user_name, "initiating staff user creation");

    let outcome = state
        .coordinator
        .run::<StaffUserRequest, ResourceId>(CREATE_USER_WITH_ROLE, &mut req)
        .await;
    respond(
        CREATE_USER_WITH_ROLE,
        outcome,
        "User and staff creation completed successfully",
    )
}

/// POST /api/gateway/users/patient: create a login account and patient.
#[tracing::instrument(skip(state, req))]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    req: Result<Json<PatientUserRequest>, JsonRejection>,
) -> Result<Json<UserCreatedResponse>, ApiError> {
    let Json(mut req) = req?;
    tracing::info!(user_name = %req.user_name, "initiating patient user creation");

    let outcome = state
        .coordinator
        .run::<PatientUserRequest, ResourceId>(CREATE_PATIENT_WITH_USER, &mut req)
        .await;
    respond(
        CREATE_PATIENT_WITH_USER,
        outcome,
        "User and patient creation completed successfully",
    )
}

fn respond(
    kind: &'static str,
    outcome: Outcome<ResourceId>,
    message: &str,
) -> Result<Json<UserCreatedResponse>, ApiError> {
    match outcome {
        Outcome::Success(user_id) => {
            metrics::counter!("gateway_requests_total", "saga" => kind, "outcome" => "success")
                .increment(1);
            Ok(Json(UserCreatedResponse {
                user_id: user_id.to_string(),
                message: message.to_string(),
            }))
        }
        Outcome::Failure(errors) => {
            metrics::counter!("gateway_requests_total", "saga" => kind, "outcome" => "failure")
                .increment(1);
            Err(ApiError::SagaFailed(errors))
        }
    }
}
