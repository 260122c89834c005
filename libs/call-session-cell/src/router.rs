// libs/call-session-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::context::CallContext;
use crate::handlers;

pub fn call_session_routes(state: Arc<CallContext>) -> Router {
    let patient_routes = Router::new()
        .route("/call/state", get(handlers::get_call_state))
        .route("/call/handled", get(handlers::get_handled_calls))
        .route("/call/documents", get(handlers::get_shareable_documents))
        .route("/call/intents", post(handlers::submit_intent));

    let doctor_routes = Router::new()
        .route("/doctor/calls/{appointment_id}", get(handlers::get_doctor_call))
        .route("/doctor/calls/{appointment_id}/start", post(handlers::start_call))
        .route("/doctor/calls/{appointment_id}/end", post(handlers::end_call))
        .route("/doctor/calls/{appointment_id}/request-documents", post(handlers::request_documents))
        .route("/doctor/calls/{appointment_id}/request-completion", post(handlers::request_completion));

    Router::new()
        .merge(patient_routes)
        .merge(doctor_routes)
        .with_state(state)
}
