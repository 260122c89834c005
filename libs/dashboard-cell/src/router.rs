// libs/dashboard-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::Dashboard;

pub fn dashboard_routes(dashboard: Arc<Dashboard>) -> Router {
    Router::new()
        .route("/badges", get(handlers::get_badges))
        .route("/doctor/readiness", get(handlers::get_doctor_readiness))
        .route("/doctor/layout", get(handlers::get_doctor_layout))
        .with_state(dashboard)
}
