pub mod inbox;
pub mod notifications;

pub use inbox::NotificationInbox;
pub use notifications::{NotificationApi, NotificationService};
