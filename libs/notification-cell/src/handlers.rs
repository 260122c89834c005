// libs/notification-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_api::{ApiError, RestClient, SessionStore};
use shared_models::error::AppError;

use crate::models::{NotificationError, NotificationTab};
use crate::services::{NotificationApi, NotificationInbox, NotificationService};

#[derive(Clone)]
pub struct NotificationContext {
    pub session_store: Arc<SessionStore>,
    pub inbox: Arc<NotificationInbox>,
}

impl NotificationContext {
    pub fn new(client: Arc<RestClient>) -> Self {
        let api: Arc<dyn NotificationApi> = Arc::new(NotificationService::new(client.clone()));
        Self {
            session_store: client.session().clone(),
            inbox: Arc::new(NotificationInbox::new(api)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TabQuery {
    #[serde(default)]
    pub tab: NotificationTab,
}

fn to_app_error(error: NotificationError) -> AppError {
    match error {
        NotificationError::NotSignedIn => AppError::Auth(error.to_string()),
        NotificationError::Api(ApiError::Auth(message)) => AppError::Auth(message),
        NotificationError::Api(ApiError::NotFound(path)) => AppError::NotFound(path),
        NotificationError::Api(e) => AppError::Upstream(e.to_string()),
    }
}

/// Refreshes the inbox from the backend and returns one tab of it.
#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<Arc<NotificationContext>>,
    Query(query): Query<TabQuery>,
) -> Result<Json<Value>, AppError> {
    let session = state
        .session_store
        .current()
        .await
        .ok_or_else(|| to_app_error(NotificationError::NotSignedIn))?;

    let counts = state
        .inbox
        .refresh(session.user_type, &session.user_id)
        .await
        .map_err(to_app_error)?;
    let notifications = state.inbox.list(query.tab).await;

    Ok(Json(json!({
        "tab": query.tab,
        "notifications": notifications,
        "counts": counts
    })))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<Arc<NotificationContext>>,
    Path(notification_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .inbox
        .mark_as_read(&notification_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "unread": state.inbox.unread_count().await
    })))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<Arc<NotificationContext>>,
    Path(notification_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state
        .inbox
        .remove(&notification_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "counts": state.inbox.counts().await
    })))
}

#[axum::debug_handler]
pub async fn clear_notifications(
    State(state): State<Arc<NotificationContext>>,
    Query(query): Query<TabQuery>,
) -> Result<Json<Value>, AppError> {
    let removed = state
        .inbox
        .clear_tab(query.tab)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "removed": removed,
        "counts": state.inbox.counts().await
    })))
}
