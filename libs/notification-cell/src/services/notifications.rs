// libs/notification-cell/src/services/notifications.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use shared_api::{ApiError, RestClient};
use shared_models::auth::UserType;

use crate::models::Notification;

#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list_for_user(&self, user_type: UserType, user_id: &str) -> Result<Vec<Notification>, ApiError>;

    async fn mark_as_read(&self, notification_id: &str) -> Result<(), ApiError>;

    async fn delete(&self, notification_id: &str) -> Result<(), ApiError>;
}

pub struct NotificationService {
    client: Arc<RestClient>,
}

impl NotificationService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationApi for NotificationService {
    #[instrument(skip(self))]
    async fn list_for_user(&self, user_type: UserType, user_id: &str) -> Result<Vec<Notification>, ApiError> {
        let path = format!(
            "/notifications/for_user/?user_type={}&user_id={}",
            user_type, user_id
        );
        let notifications: Vec<Notification> = self.client.get_collection(&path).await?;
        debug!("Fetched {} notifications", notifications.len());
        Ok(notifications)
    }

    async fn mark_as_read(&self, notification_id: &str) -> Result<(), ApiError> {
        self.client
            .post_empty(&format!("/notifications/{}/mark_as_read/", notification_id))
            .await
    }

    async fn delete(&self, notification_id: &str) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/notifications/{}/", notification_id))
            .await
    }
}
