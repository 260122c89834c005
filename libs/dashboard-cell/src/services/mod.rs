pub mod badges;
pub mod dashboard;
pub mod layout;
pub mod poller;
pub mod readiness;

pub use badges::BadgeService;
pub use dashboard::Dashboard;
pub use layout::{weekly_schedule, DoctorLayoutService};
pub use poller::DashboardPoller;
pub use readiness::ReadinessService;
