//! Integration tests for the API server.

use std::sync::OnceLock;

use api::InMemoryServices;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> (axum::Router, InMemoryServices) {
    let services = InMemoryServices::default();
    let state = api::create_in_memory_state(&services).unwrap();
    (api::create_app(state, get_metrics_handle()), services)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn staff_body(user_name: &str) -> Value {
    json!({
        "userName": user_name,
        "email": format!("{user_name}@clinic.example"),
        "password": "Passw0rd!",
        "firstName": "Jane",
        "lastName": "Doe",
        "roleIds": [],
        "staffRole": 1,
        "departmentId": "6f1c1f5e-8d0a-4a57-9e43-0d3c1b6f4a21",
        "title": "Dr.",
        "licenseNumber": "LIC-001"
    })
}

fn patient_body(user_name: &str, identification_number: &str) -> Value {
    json!({
        "userName": user_name,
        "email": format!("{user_name}@mail.example"),
        "password": "Passw0rd!",
        "firstName": "Pat",
        "lastName": "Smith",
        "identificationNumber": identification_number,
        "dateOfBirth": "1990-06-15",
        "gender": "Female",
        "bloodType": "A+",
        "address": "1 Main St",
        "phoneNumber": "555-0100",
        "emergencyContactName": "Sam Smith",
        "emergencyContactPhone": "555-0101"
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(
        json["sagas"],
        json!(["create-patient-with-user", "create-user-with-role"])
    );
}

#[tokio::test]
async fn test_create_staff_user() {
    let (app, services) = setup();

    let response = app
        .oneshot(post_json("/api/gateway/users/staff", &staff_body("jdoe")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(
        json["message"],
        "User and staff creation completed successfully"
    );
    let user_id: common::ResourceId = json["userId"].as_str().unwrap().parse().unwrap();
    assert!(services.identity.has_user(user_id));
    assert_eq!(services.organisation.staff_count(), 1);
}

#[tokio::test]
async fn test_staff_failure_returns_errors_and_rolls_back() {
    let (app, services) = setup();
    services
        .organisation
        .set_fail_on_create(Some("License number is required"));

    let response = app
        .oneshot(post_json("/api/gateway/users/staff", &staff_body("jdoe")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert_eq!(
        json["errors"],
        json!(["Failed to create staff member: License number is required"])
    );
    assert_eq!(services.identity.user_count(), 0);
    assert_eq!(services.identity.deleted().len(), 1);
}

#[tokio::test]
async fn test_create_patient_user() {
    let (app, services) = setup();

    let response = app
        .oneshot(post_json(
            "/api/gateway/users/patient",
            &patient_body("pat", "ID-1"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = read_json(response).await;
    assert_eq!(
        json["message"],
        "User and patient creation completed successfully"
    );
    assert_eq!(services.patient.patient_count(), 1);
}

#[tokio::test]
async fn test_duplicate_patient_is_rejected() {
    let (app, services) = setup();

    let first = app
        .clone()
        .oneshot(post_json(
            "/api/gateway/users/patient",
            &patient_body("pat", "ID-1"),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_json(
            "/api/gateway/users/patient",
            &patient_body("pat2", "ID-1"),
        ))
        .await
        .unwrap();

    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let json = read_json(second).await;
    assert_eq!(
        json["errors"],
        json!(["Failed to create patient: Patient with identification number 'ID-1' already exists"])
    );
    assert_eq!(services.identity.user_count(), 1);
    assert_eq!(services.patient.patient_count(), 1);
}

#[tokio::test]
async fn test_unreachable_service_returns_generic_error() {
    let (app, services) = setup();
    services.patient.set_unavailable(true);

    let response = app
        .oneshot(post_json(
            "/api/gateway/users/patient",
            &patient_body("pat", "ID-1"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert_eq!(
        json["errors"],
        json!(["An error occurred in step create_patient"])
    );
    assert_eq!(services.identity.user_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_a_bad_request() {
    let (app, services) = setup();

    let response = app
        .oneshot(post_json(
            "/api/gateway/users/staff",
            &json!({ "userName": "jdoe" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = read_json(response).await;
    assert!(json["errors"][0].as_str().unwrap().contains("missing field"));
    assert_eq!(services.identity.user_count(), 0);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();

    let _ = app
        .clone()
        .oneshot(post_json("/api/gateway/users/staff", &staff_body("metrics")))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("saga_executions_total"));
    assert!(text.contains("gateway_requests_total"));
}
