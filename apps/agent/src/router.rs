use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tracing::info;

use call_session_cell::{call_session_routes, CallContext};
use dashboard_cell::{dashboard_routes, Dashboard};
use notification_cell::{notification_routes, NotificationContext};
use shared_api::{RestClient, SessionStore};
use shared_config::AppConfig;

#[derive(Clone)]
pub struct AgentState {
    pub session_store: Arc<SessionStore>,
    pub calls: Arc<CallContext>,
    pub notifications: Arc<NotificationContext>,
    pub dashboard: Arc<Dashboard>,
}

impl AgentState {
    pub fn new(config: &AppConfig, client: Arc<RestClient>) -> Self {
        Self {
            session_store: client.session().clone(),
            calls: Arc::new(CallContext::new(config, client.clone())),
            notifications: Arc::new(NotificationContext::new(client.clone())),
            dashboard: Arc::new(Dashboard::new(client)),
        }
    }

    /// Drops every piece of session-scoped state.
    pub async fn clear(&self) {
        self.calls.call_session.reset().await;
        self.calls.monitors.stop_all().await;
        self.notifications.inbox.clear().await;
        self.dashboard.clear().await;
    }
}

async fn health(State(state): State<AgentState>) -> Json<Value> {
    let session = state.session_store.current().await;
    let phase = state.calls.call_session.phase().await;

    Json(json!({
        "status": "ok",
        "signed_in": session.is_some(),
        "session": session,
        "call_phase": phase.name()
    }))
}

async fn logout(State(state): State<AgentState>) -> Json<Value> {
    state.session_store.logout().await;
    state.clear().await;
    info!("Signed out through the control surface");

    Json(json!({
        "success": true,
        "message": "Signed out"
    }))
}

pub fn create_router(state: AgentState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session/logout", post(logout))
        .with_state(state.clone())
        .merge(call_session_routes(state.calls.clone()))
        .merge(notification_routes(state.notifications.clone()))
        .merge(dashboard_routes(state.dashboard.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use shared_utils::test_utils::{MockPortalResponses, TestConfig};

    fn test_state() -> AgentState {
        let config = TestConfig::default();
        AgentState::new(&config.to_app_config(), config.rest_client())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_identity_and_phase() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["signed_in"], true);
        assert_eq!(body["session"]["user_type"], "patient");
        assert!(body["session"].get("auth_token").is_none());
        assert_eq!(body["call_phase"], "idle");
    }

    #[tokio::test]
    async fn test_logout_clears_session_scoped_state() {
        let state = test_state();
        let started = serde_json::from_value(MockPortalResponses::started_appointment("a1")).unwrap();
        state.calls.call_session.observe(&[started]).await;

        let app = create_router(state.clone());
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/session/logout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert!(!state.session_store.is_active().await);
        assert_eq!(state.calls.call_session.phase().await.name(), "idle");

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/call/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(Request::builder().uri("/call/intents").method("POST")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"intent":"accept"}"#))
                .unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
