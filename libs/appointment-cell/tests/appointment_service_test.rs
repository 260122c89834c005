use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{
    AppointmentApi, AppointmentPatch, AppointmentService, CallStatus, DocumentApi,
    DocumentService,
};
use shared_api::ApiError;
use shared_utils::test_utils::{MockPortalResponses, TestConfig};

#[tokio::test]
async fn test_list_for_patient_accepts_bare_and_paginated() {
    let mock_server = MockServer::start().await;
    let service = AppointmentService::new(TestConfig::with_base_url(&mock_server.uri()).rest_client());

    Mock::given(method("GET"))
        .and(path("/patients/patient-1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockPortalResponses::started_appointment("a1"),
            MockPortalResponses::idle_appointment("a2"),
        ]))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/doctors/doctor-1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::paginated(vec![
            MockPortalResponses::started_appointment("a1"),
        ])))
        .mount(&mock_server)
        .await;

    let for_patient = service.list_for_patient("patient-1").await.unwrap();
    assert_eq!(for_patient.len(), 2);
    assert!(for_patient[0].is_offering_call());
    assert!(!for_patient[1].is_offering_call());

    let for_doctor = service.list_for_doctor("doctor-1").await.unwrap();
    assert_eq!(for_doctor.len(), 1);
}

#[tokio::test]
async fn test_patch_sends_only_set_fields() {
    let mock_server = MockServer::start().await;
    let service = AppointmentService::new(TestConfig::with_base_url(&mock_server.uri()).rest_client());

    Mock::given(method("PATCH"))
        .and(path("/appointments/a1/"))
        .and(body_json(json!({
            "call_status": "declined",
            "appointment_started": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    service.patch("a1", &AppointmentPatch::decline_call()).await.unwrap();
}

#[tokio::test]
async fn test_get_single_appointment() {
    let mock_server = MockServer::start().await;
    let service = AppointmentService::new(TestConfig::with_base_url(&mock_server.uri()).rest_client());

    Mock::given(method("GET"))
        .and(path("/appointments/a1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockPortalResponses::with_fields(
            MockPortalResponses::started_appointment("a1"),
            json!({"call_status": "ended", "appointment_started": false}),
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/appointments/gone/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let appointment = service.get("a1").await.unwrap();
    assert_eq!(appointment.call_status, Some(CallStatus::Ended));
    assert!(appointment.call_is_over());

    assert_matches!(service.get("gone").await, Err(ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_patient_documents_decode() {
    let mock_server = MockServer::start().await;
    let service = DocumentService::new(TestConfig::with_base_url(&mock_server.uri()).rest_client());

    Mock::given(method("GET"))
        .and(path("/patients/patient-1/documents/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockPortalResponses::document("d1", Some("a1"), "Lab Report", 5),
            MockPortalResponses::document("d2", None, "Prescription", 60),
        ]))
        .mount(&mock_server)
        .await;

    let documents = service.list_for_patient("patient-1").await.unwrap();

    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].appointment.as_deref(), Some("a1"));
    assert!(!documents[0].is_prescription());
    assert!(documents[1].is_prescription());
    assert!(documents[1].uploaded_at.is_some());
}
