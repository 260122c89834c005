//! # Notification Cell
//!
//! The header bell: a per-user notification inbox fetched from
//! `/notifications/for_user/`, filtered by tab, with mark-as-read, delete and
//! clear-tab operations written straight through to the backend.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Notification, NotificationCounts, NotificationError, NotificationTab};
pub use handlers::NotificationContext;
pub use router::notification_routes;
pub use services::{NotificationApi, NotificationInbox, NotificationService};
