// libs/notification-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{self, NotificationContext};

pub fn notification_routes(state: Arc<NotificationContext>) -> Router {
    Router::new()
        .route(
            "/notifications",
            get(handlers::list_notifications).delete(handlers::clear_notifications),
        )
        .route("/notifications/{notification_id}", delete(handlers::delete_notification))
        .route("/notifications/{notification_id}/read", post(handlers::mark_notification_read))
        .with_state(state)
}
