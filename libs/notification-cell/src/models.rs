// libs/notification-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_api::ApiError;
use shared_models::wire::{id_string, null_as_false};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub notification_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationTab {
    #[default]
    All,
    System,
    Booking,
}

impl NotificationTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTab::All => "all",
            NotificationTab::System => "system",
            NotificationTab::Booking => "booking",
        }
    }

    pub fn includes(&self, notification: &Notification) -> bool {
        match self {
            NotificationTab::All => true,
            tab => notification.notification_type == tab.as_str(),
        }
    }
}

impl fmt::Display for NotificationTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(NotificationTab::All),
            "system" => Ok(NotificationTab::System),
            "booking" => Ok(NotificationTab::Booking),
            other => Err(format!("unknown notification tab '{}'", other)),
        }
    }
}

/// Tab labels and the bell badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationCounts {
    pub all: usize,
    pub system: usize,
    pub booking: usize,
    pub unread: usize,
}

impl NotificationCounts {
    pub fn from_notifications(notifications: &[Notification]) -> Self {
        Self {
            all: notifications.len(),
            system: notifications.iter().filter(|n| NotificationTab::System.includes(n)).count(),
            booking: notifications.iter().filter(|n| NotificationTab::Booking.includes(n)).count(),
            unread: notifications.iter().filter(|n| !n.is_read).count(),
        }
    }
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("No signed-in user")]
    NotSignedIn,

    #[error("Portal API error: {0}")]
    Api(#[from] ApiError),
}
