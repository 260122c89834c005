// libs/notification-cell/src/services/inbox.rs
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::RwLock;
use tracing::{error, info};

use shared_models::auth::UserType;

use crate::models::{Notification, NotificationCounts, NotificationError, NotificationTab};
use crate::services::notifications::NotificationApi;

/// Local copy of the signed-in user's notifications.
///
/// Mutations go to the backend first; the local list only changes once the
/// backend accepted them.
pub struct NotificationInbox {
    api: Arc<dyn NotificationApi>,
    items: RwLock<Vec<Notification>>,
}

impl NotificationInbox {
    pub fn new(api: Arc<dyn NotificationApi>) -> Self {
        Self {
            api,
            items: RwLock::new(Vec::new()),
        }
    }

    pub async fn refresh(&self, user_type: UserType, user_id: &str) -> Result<NotificationCounts, NotificationError> {
        let notifications = self.api.list_for_user(user_type, user_id).await?;
        let counts = NotificationCounts::from_notifications(&notifications);
        *self.items.write().await = notifications;
        Ok(counts)
    }

    pub async fn list(&self, tab: NotificationTab) -> Vec<Notification> {
        self.items
            .read()
            .await
            .iter()
            .filter(|n| tab.includes(n))
            .cloned()
            .collect()
    }

    pub async fn counts(&self) -> NotificationCounts {
        NotificationCounts::from_notifications(&self.items.read().await)
    }

    pub async fn unread_count(&self) -> usize {
        self.items.read().await.iter().filter(|n| !n.is_read).count()
    }

    pub async fn mark_as_read(&self, notification_id: &str) -> Result<(), NotificationError> {
        self.api.mark_as_read(notification_id).await?;

        if let Some(notification) = self
            .items
            .write()
            .await
            .iter_mut()
            .find(|n| n.id == notification_id)
        {
            notification.is_read = true;
        }
        Ok(())
    }

    pub async fn remove(&self, notification_id: &str) -> Result<(), NotificationError> {
        self.api.delete(notification_id).await?;
        self.items.write().await.retain(|n| n.id != notification_id);
        Ok(())
    }

    /// Deletes every notification in `tab` concurrently. Returns how many were removed.
    pub async fn clear_tab(&self, tab: NotificationTab) -> Result<usize, NotificationError> {
        let ids: Vec<String> = self.list(tab).await.into_iter().map(|n| n.id).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let deletions = ids.iter().map(|id| self.api.delete(id));
        if let Err(e) = try_join_all(deletions).await {
            error!("Failed to clear {} notifications: {}", tab, e);
            return Err(e.into());
        }

        self.items.write().await.retain(|n| !tab.includes(n));
        info!("Cleared {} notifications from the {} tab", ids.len(), tab);
        Ok(ids.len())
    }

    /// Forgets the cached list, e.g. on logout.
    pub async fn clear(&self) {
        self.items.write().await.clear();
    }
}
