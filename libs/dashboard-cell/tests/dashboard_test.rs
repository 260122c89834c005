use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tokio::sync::watch;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dashboard_cell::{dashboard_routes, Dashboard, DashboardError, DashboardPoller};
use shared_api::ApiError;
use shared_models::auth::UserType;
use shared_utils::test_utils::{MockPortalResponses, TestConfig};

fn doctor_dashboard(mock_server: &MockServer) -> Arc<Dashboard> {
    let client = TestConfig::with_base_url(&mock_server.uri())
        .as_doctor("doctor-1")
        .rest_client();
    Arc::new(Dashboard::new(client))
}

fn feedback_rows() -> Vec<Value> {
    vec![json!({
        "id": 11,
        "patient_info": {"name": "Ciara Walsh", "avatar": null},
        "rating": 5,
        "comment": "Very thorough",
        "doctor_reply": null,
        "created_at": "2024-03-02T09:15:00Z"
    })]
}

async fn mount_layout(mock_server: &MockServer, feedback: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::doctor_profile("doctor-1", false)))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/working_hours/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/break_times/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"day_of_week": "Wednesday", "start_time": "12:30:00", "end_time": "13:00:00"}
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockPortalResponses::idle_appointment("a1"),
            MockPortalResponses::idle_appointment("a2"),
        ]))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/feedback/"))
        .respond_with(feedback)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_badges_sum_unread_and_count_pending() {
    let mock_server = MockServer::start().await;
    let dashboard = doctor_dashboard(&mock_server);

    Mock::given(method("GET"))
        .and(path("/messages/conversations/"))
        .and(query_param("user_type", "doctor"))
        .and(query_param("user_id", "doctor-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "unread_count": 3},
            {"id": 2, "unread_count": null},
            {"id": 3}
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/payment-requests/"))
        .and(query_param("doctor_id", "doctor-1"))
        .and(query_param("status", "pending"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::paginated(vec![
            json!({"id": 1}),
            json!({"id": 2}),
        ])))
        .mount(&mock_server)
        .await;

    let counts = dashboard.refresh_badges().await.unwrap();

    assert_eq!(counts.unread_messages, 3);
    assert_eq!(counts.pending_payments, 2);
}

#[tokio::test]
async fn test_one_failing_badge_keeps_the_other() {
    let mock_server = MockServer::start().await;
    let dashboard = doctor_dashboard(&mock_server);

    Mock::given(method("GET"))
        .and(path("/messages/conversations/"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/payment-requests/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 9}])))
        .mount(&mock_server)
        .await;

    let counts = dashboard.refresh_badges().await.unwrap();
    assert_eq!(counts.unread_messages, 0);
    assert_eq!(counts.pending_payments, 1);
}

#[tokio::test]
async fn test_readiness_reads_single_object_pricing() {
    let mock_server = MockServer::start().await;
    let dashboard = doctor_dashboard(&mock_server);

    Mock::given(method("GET"))
        .and(path("/doctor-bank-accounts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::paginated(vec![
            json!({"id": 1, "iban": "IE29AIBK93115212345678"}),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doctor-pricing/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "online_fee": "45.00",
            "in_person_consultation_fee": 70
        })))
        .mount(&mock_server)
        .await;

    let readiness = dashboard.refresh_readiness().await.unwrap();

    assert!(readiness.has_bank_account);
    assert!(readiness.has_pricing);
    assert_eq!(readiness.online_fee, 45.0);
    assert_eq!(readiness.in_person_fee, 70.0);
    assert!(readiness.is_ready());
}

#[tokio::test]
async fn test_missing_pricing_is_not_ready() {
    let mock_server = MockServer::start().await;
    let dashboard = doctor_dashboard(&mock_server);

    Mock::given(method("GET"))
        .and(path("/doctor-bank-accounts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doctor-pricing/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let readiness = dashboard.refresh_readiness().await.unwrap();
    assert!(!readiness.has_bank_account);
    assert!(!readiness.has_pricing);
}

#[tokio::test]
async fn test_layout_degrades_on_schedule_failure() {
    let mock_server = MockServer::start().await;
    mount_layout(&mock_server, ResponseTemplate::new(200).set_body_json(feedback_rows())).await;
    let dashboard = doctor_dashboard(&mock_server);

    let layout = dashboard.load_layout().await.unwrap();

    assert_eq!(layout.profile.full_name(), "Aoife Byrne");
    assert_eq!(layout.appointments.len(), 2);
    assert_eq!(layout.feedback.len(), 1);
    assert_eq!(layout.feedback[0].patient_info.name.as_deref(), Some("Ciara Walsh"));
    assert_eq!(layout.weekly_schedule.len(), 7);
    assert!(layout.weekly_schedule.iter().all(|d| !d.enabled));
    assert_eq!(layout.weekly_schedule[2].breaks[0].start, "12:30");

    assert_eq!(dashboard.refresh_appointments().await.unwrap(), 2);
}

#[tokio::test]
async fn test_layout_reads_paginated_feedback() {
    let mock_server = MockServer::start().await;
    mount_layout(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(MockPortalResponses::paginated(feedback_rows())),
    )
    .await;
    let dashboard = doctor_dashboard(&mock_server);

    let layout = dashboard.load_layout().await.unwrap();

    assert_eq!(layout.feedback.len(), 1);
    assert_eq!(layout.feedback[0].rating, Some(5.0));
}

#[tokio::test]
async fn test_layout_fails_when_feedback_fails() {
    let mock_server = MockServer::start().await;
    mount_layout(&mock_server, ResponseTemplate::new(500)).await;
    let dashboard = doctor_dashboard(&mock_server);

    assert_matches!(
        dashboard.load_layout().await,
        Err(DashboardError::Api(ApiError::Status { status: 500, .. }))
    );
}

#[tokio::test]
async fn test_patient_cannot_read_doctor_readiness() {
    let mock_server = MockServer::start().await;
    let client = TestConfig::with_base_url(&mock_server.uri()).rest_client();
    let app = dashboard_routes(Arc::new(Dashboard::new(client)));

    let response = app
        .oneshot(Request::builder().uri("/doctor/readiness").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_badges_route_serves_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/messages/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"unread_count": 4}])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/payment-requests/"))
        .and(query_param("patient_id", "patient-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TestConfig::with_base_url(&mock_server.uri()).rest_client();
    let app = dashboard_routes(Arc::new(Dashboard::new(client)));

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/badges").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["unread_messages"], 4);
        assert_eq!(body["pending_payments"], 0);
    }
}

#[tokio::test]
async fn test_poller_stops_when_signed_out() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri());
    let client = config.rest_client();
    client.session().logout().await;

    let poller = DashboardPoller::new(
        Arc::new(Dashboard::new(client)),
        UserType::Patient,
        &config.to_app_config(),
    );
    let (_stop, shutdown) = watch::channel(false);

    tokio::time::timeout(Duration::from_secs(2), poller.run(shutdown))
        .await
        .expect("poller should stop without a session");
}
