use std::sync::Arc;

use assert_matches::assert_matches;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use tokio_test::assert_ok;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::{
    notification_routes, NotificationApi, NotificationContext, NotificationError, NotificationInbox,
    NotificationService, NotificationTab,
};
use shared_api::ApiError;
use shared_models::auth::UserType;
use shared_utils::test_utils::{MockPortalResponses, TestConfig};

async fn mount_inbox(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/notifications/for_user/"))
        .and(query_param("user_type", "patient"))
        .and(query_param("user_id", "patient-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![
            MockPortalResponses::notification("n1", "booking", false),
            MockPortalResponses::notification("n2", "system", false),
            MockPortalResponses::notification("n3", "booking", true),
        ]))
        .mount(mock_server)
        .await;
}

fn inbox_for(mock_server: &MockServer) -> NotificationInbox {
    let client = TestConfig::with_base_url(&mock_server.uri()).rest_client();
    let api: Arc<dyn NotificationApi> = Arc::new(NotificationService::new(client));
    NotificationInbox::new(api)
}

#[tokio::test]
async fn test_refresh_counts_tabs_and_unread() {
    let mock_server = MockServer::start().await;
    mount_inbox(&mock_server).await;
    let inbox = inbox_for(&mock_server);

    let counts = inbox.refresh(UserType::Patient, "patient-1").await.unwrap();

    assert_eq!(counts.all, 3);
    assert_eq!(counts.booking, 2);
    assert_eq!(counts.system, 1);
    assert_eq!(counts.unread, 2);
    assert_eq!(inbox.list(NotificationTab::System).await[0].id, "n2");
}

#[tokio::test]
async fn test_mark_as_read_posts_and_updates_locally() {
    let mock_server = MockServer::start().await;
    mount_inbox(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/notifications/n1/mark_as_read/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let inbox = inbox_for(&mock_server);
    inbox.refresh(UserType::Patient, "patient-1").await.unwrap();

    assert_ok!(inbox.mark_as_read("n1").await);
    assert_eq!(inbox.unread_count().await, 1);
}

#[tokio::test]
async fn test_clear_tab_deletes_each_notification() {
    let mock_server = MockServer::start().await;
    mount_inbox(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/notifications/n1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/notifications/n3/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let inbox = inbox_for(&mock_server);
    inbox.refresh(UserType::Patient, "patient-1").await.unwrap();

    let removed = inbox.clear_tab(NotificationTab::Booking).await.unwrap();

    assert_eq!(removed, 2);
    let remaining = inbox.list(NotificationTab::All).await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "n2");
}

#[tokio::test]
async fn test_failed_clear_keeps_local_list() {
    let mock_server = MockServer::start().await;
    mount_inbox(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/notifications/n1/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/notifications/n3/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("locked"))
        .mount(&mock_server)
        .await;

    let inbox = inbox_for(&mock_server);
    inbox.refresh(UserType::Patient, "patient-1").await.unwrap();

    let result = inbox.clear_tab(NotificationTab::Booking).await;

    assert_matches!(result, Err(NotificationError::Api(ApiError::Status { status: 500, .. })));
    assert_eq!(inbox.counts().await.all, 3);
}

#[tokio::test]
async fn test_routes_list_and_delete() {
    let mock_server = MockServer::start().await;
    mount_inbox(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/notifications/n2/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TestConfig::with_base_url(&mock_server.uri()).rest_client();
    let app = notification_routes(Arc::new(NotificationContext::new(client)));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/notifications?tab=booking").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["tab"], "booking");
    assert_eq!(body["notifications"].as_array().unwrap().len(), 2);
    assert_eq!(body["counts"]["unread"], 2);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/notifications/n2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["counts"]["all"], 2);
    assert_eq!(body["counts"]["system"], 0);
}
