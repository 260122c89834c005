// libs/call-session-cell/src/services/mod.rs
pub mod dispatcher;
pub mod doctor;
pub mod handled;
pub mod monitor;
pub mod poller;
pub mod reducer;
pub mod session;

pub use dispatcher::ActionDispatcher;
pub use doctor::DoctorCallService;
pub use handled::HandledSet;
pub use monitor::{DoctorCallMonitor, DoctorCallTracker, MonitorRegistry};
pub use poller::SessionPoller;
pub use reducer::CallState;
pub use session::CallSession;
