// libs/call-session-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use shared_api::ApiError;
use shared_models::auth::{UserSession, UserType};
use shared_models::error::AppError;

use crate::context::CallContext;
use crate::models::{CallIntent, CallSessionError};

fn to_app_error(error: CallSessionError) -> AppError {
    match error {
        CallSessionError::InvalidTransition { .. } => AppError::Conflict(error.to_string()),
        CallSessionError::DoctorBlocked { .. } | CallSessionError::WrongRole(_) => {
            AppError::Forbidden(error.to_string())
        }
        CallSessionError::MonitorNotFound(_) => AppError::NotFound(error.to_string()),
        CallSessionError::NotSignedIn => AppError::Auth(error.to_string()),
        CallSessionError::Api(ApiError::Auth(message)) => AppError::Auth(message),
        CallSessionError::Api(ApiError::NotFound(path)) => AppError::NotFound(path),
        CallSessionError::Api(e) => AppError::Upstream(e.to_string()),
        CallSessionError::Encoding(e) => AppError::Internal(e.to_string()),
    }
}

async fn require_signed_in(state: &CallContext) -> Result<UserSession, AppError> {
    state
        .session_store
        .current()
        .await
        .ok_or_else(|| to_app_error(CallSessionError::NotSignedIn))
}

async fn require_role(state: &CallContext, role: UserType) -> Result<UserSession, AppError> {
    let session = require_signed_in(state).await?;

    if session.user_type != role {
        warn!("{} {} attempted a {} call action", session.user_type, session.user_id, role);
        return Err(to_app_error(CallSessionError::WrongRole(role.to_string())));
    }

    Ok(session)
}

// ==============================================================================
// PATIENT CALL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_call_state(
    State(state): State<Arc<CallContext>>,
) -> Result<Json<Value>, AppError> {
    require_signed_in(&state).await?;

    let snapshot = state.call_session.snapshot().await;
    Ok(Json(json!(snapshot)))
}

#[axum::debug_handler]
pub async fn get_handled_calls(
    State(state): State<Arc<CallContext>>,
) -> Result<Json<Value>, AppError> {
    require_signed_in(&state).await?;

    let handled = state.call_session.handled().await;
    Ok(Json(json!({
        "handled": handled,
        "total": handled.len()
    })))
}

#[axum::debug_handler]
pub async fn get_shareable_documents(
    State(state): State<Arc<CallContext>>,
) -> Result<Json<Value>, AppError> {
    require_role(&state, UserType::Patient).await?;

    let documents = state.dispatcher.shareable_documents().await.map_err(to_app_error)?;

    Ok(Json(json!({
        "documents": documents,
        "total": documents.len()
    })))
}

/// Applies one patient intent and reports the resulting phase and any
/// backend updates that failed.
#[axum::debug_handler]
pub async fn submit_intent(
    State(state): State<Arc<CallContext>>,
    Json(intent): Json<CallIntent>,
) -> Result<Json<Value>, AppError> {
    require_role(&state, UserType::Patient).await?;

    let outcome = state.dispatcher.dispatch(intent).await.map_err(to_app_error)?;

    Ok(Json(json!({
        "success": outcome.failed_updates.is_empty(),
        "outcome": outcome
    })))
}

// ==============================================================================
// DOCTOR CALL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn start_call(
    State(state): State<Arc<CallContext>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = require_role(&state, UserType::Doctor).await?;

    state
        .doctor_calls
        .start_call(&doctor.user_id, &appointment_id)
        .await
        .map_err(to_app_error)?;

    state.monitors.start(&appointment_id, None).await;

    Ok(Json(json!({
        "success": true,
        "appointment_id": appointment_id,
        "message": "Call started, waiting for the patient to answer"
    })))
}

#[axum::debug_handler]
pub async fn end_call(
    State(state): State<Arc<CallContext>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_role(&state, UserType::Doctor).await?;

    state
        .doctor_calls
        .end_call(&appointment_id)
        .await
        .map_err(to_app_error)?;
    state.monitors.stop(&appointment_id).await;

    Ok(Json(json!({
        "success": true,
        "appointment_id": appointment_id
    })))
}

#[axum::debug_handler]
pub async fn request_documents(
    State(state): State<Arc<CallContext>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_role(&state, UserType::Doctor).await?;

    state
        .doctor_calls
        .request_documents(&appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Document request sent to the patient"
    })))
}

#[axum::debug_handler]
pub async fn request_completion(
    State(state): State<Arc<CallContext>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_role(&state, UserType::Doctor).await?;

    state
        .doctor_calls
        .request_completion(&appointment_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Completion request sent to the patient"
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_call(
    State(state): State<Arc<CallContext>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    require_role(&state, UserType::Doctor).await?;

    let view = state.monitors.view(&appointment_id).await.map_err(to_app_error)?;
    Ok(Json(json!(view)))
}
