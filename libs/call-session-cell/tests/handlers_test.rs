use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use call_session_cell::{call_session_routes, CallContext, CallIntent};
use shared_utils::test_utils::{MockPortalResponses, TestConfig};

fn app(config: TestConfig) -> (Router, Arc<CallContext>) {
    let context = Arc::new(CallContext::new(&config.to_app_config(), config.rest_client()));
    (call_session_routes(context.clone()), context)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_initial_call_state_is_idle() {
    let mock_server = MockServer::start().await;
    let (app, _) = app(TestConfig::with_base_url(&mock_server.uri()));

    let (status, body) = send(&app, get("/call/state")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phase"]["phase"], "idle");
    assert_eq!(body["version"], 0);
    assert_eq!(body["handled"], json!([]));
}

#[tokio::test]
async fn test_intent_out_of_phase_is_conflict() {
    let mock_server = MockServer::start().await;
    let (app, _) = app(TestConfig::with_base_url(&mock_server.uri()));

    let (status, body) = send(&app, post_json("/call/intents", json!({"intent": "accept"}))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("accept"));
}

#[tokio::test]
async fn test_decline_via_intent_endpoint() {
    let mock_server = MockServer::start().await;
    let (app, context) = app(TestConfig::with_base_url(&mock_server.uri()));

    Mock::given(method("PATCH"))
        .and(path("/appointments/a1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let started = serde_json::from_value(MockPortalResponses::started_appointment("a1")).unwrap();
    context.call_session.observe(&[started]).await;

    let (status, body) = send(&app, post_json("/call/intents", json!({"intent": "decline"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["outcome"]["phase"]["phase"], "idle");

    let (_, handled) = send(&app, get("/call/handled")).await;
    assert_eq!(handled["handled"], json!(["a1"]));
    assert_eq!(handled["total"], 1);
}

#[tokio::test]
async fn test_call_state_requires_a_session() {
    let mock_server = MockServer::start().await;
    let (app, context) = app(TestConfig::with_base_url(&mock_server.uri()));

    context.session_store.logout().await;

    let (status, _) = send(&app, get("/call/state")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/call/handled")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_document_selection_offers_only_the_patients_documents() {
    let mock_server = MockServer::start().await;
    let (app, context) = app(TestConfig::with_base_url(&mock_server.uri()));

    Mock::given(method("GET"))
        .and(path("/patients/patient-1/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockPortalResponses::document("d1", None, "Lab Report", 30),
            MockPortalResponses::document("d2", Some("a1"), "Imaging", 5),
        ]))
        .mount(&mock_server)
        .await;

    let (status, body) = send(&app, get("/call/documents")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["documents"][0]["id"], "d1");

    let started = serde_json::from_value(MockPortalResponses::started_appointment("a1")).unwrap();
    context.call_session.observe(&[started]).await;
    context.call_session.apply(CallIntent::Accept).await.unwrap();
    let requested = serde_json::from_value(MockPortalResponses::with_fields(
        MockPortalResponses::started_appointment("a1"),
        json!({"call_status": "answered", "document_request_status": "requested"}),
    ))
    .unwrap();
    context.call_session.observe(&[requested]).await;

    let (status, body) = send(
        &app,
        post_json("/call/intents", json!({"intent": "grant_document_permission"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["phase"]["call"]["documents"]["step"], "selecting");
    assert_eq!(body["outcome"]["phase"]["call"]["documents"]["offered"], json!(["d1", "d2"]));

    let (status, _) = send(
        &app,
        post_json("/call/intents", json!({"intent": "toggle_document", "document_id": "d2"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json("/call/intents", json!({"intent": "toggle_document", "document_id": "not-mine"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_doctor_routes_reject_patients() {
    let mock_server = MockServer::start().await;
    let (app, _) = app(TestConfig::with_base_url(&mock_server.uri()));

    let (status, _) = send(&app, post_empty("/doctor/calls/a1/start")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_doctor_starts_call_and_monitor_is_visible() {
    let mock_server = MockServer::start().await;
    let (app, context) = app(TestConfig::with_base_url(&mock_server.uri()).as_doctor("doctor-1"));

    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::doctor_profile("doctor-1", false)))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/appointments/a1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/appointments/a1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::started_appointment("a1")))
        .mount(&mock_server)
        .await;

    let (status, body) = send(&app, post_empty("/doctor/calls/a1/start")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["appointment_id"], "a1");

    let (status, view) = send(&app, get("/doctor/calls/a1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["appointment_id"], "a1");
    assert_eq!(view["patient_answered"], false);

    let (status, _) = send(&app, post_empty("/doctor/calls/a1/end")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(context.monitors.active_count().await, 0);

    let (status, _) = send(&app, get("/doctor/calls/a1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blocked_doctor_start_is_forbidden() {
    let mock_server = MockServer::start().await;
    let (app, context) = app(TestConfig::with_base_url(&mock_server.uri()).as_doctor("doctor-1"));

    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::doctor_profile("doctor-1", true)))
        .mount(&mock_server)
        .await;

    let (status, body) = send(&app, post_empty("/doctor/calls/a1/start")).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("Licence review"));
    assert_eq!(context.monitors.active_count().await, 0);
}
