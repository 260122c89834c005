// libs/dashboard-cell/src/services/badges.rs
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use shared_api::RestClient;
use shared_models::auth::UserType;

use crate::models::{Conversation, DashboardError};

/// Sidebar counters.
pub struct BadgeService {
    client: Arc<RestClient>,
}

impl BadgeService {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    pub async fn unread_messages(&self, user_type: UserType, user_id: &str) -> Result<u64, DashboardError> {
        let path = format!(
            "/messages/conversations/?user_type={}&user_id={}",
            user_type, user_id
        );
        let conversations: Vec<Conversation> = self.client.get_collection(&path).await?;
        let total: u64 = conversations
            .iter()
            .map(|c| c.unread_count.unwrap_or(0))
            .sum();
        debug!("{} unread messages across {} conversations", total, conversations.len());
        Ok(total)
    }

    pub async fn pending_payments(&self, user_type: UserType, user_id: &str) -> Result<usize, DashboardError> {
        let owner = match user_type {
            UserType::Doctor => "doctor_id",
            _ => "patient_id",
        };
        let path = format!("/payment-requests/?{}={}&status=pending", owner, user_id);
        let requests: Vec<Value> = self.client.get_collection(&path).await?;
        Ok(requests.len())
    }
}
