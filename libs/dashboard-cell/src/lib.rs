//! # Dashboard Cell
//!
//! Everything the portal chrome shows around the call flow:
//!
//! - sidebar badges (unread messages, pending payment requests)
//! - the doctor readiness banner (bank account and consultation pricing)
//! - the doctor layout bundle (profile, weekly schedule, appointments, feedback)
//!
//! Values are cached in a [`Dashboard`] and kept fresh by a [`DashboardPoller`].

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    BadgeCounts, DashboardError, DaySchedule, DoctorLayout, DoctorPricing, DoctorProfile, Feedback,
    Readiness, TimeRange,
};
pub use router::dashboard_routes;
pub use services::{
    BadgeService, Dashboard, DashboardPoller, DoctorLayoutService, ReadinessService,
};
