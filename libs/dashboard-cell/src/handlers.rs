// libs/dashboard-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_api::ApiError;
use shared_models::error::AppError;

use crate::models::DashboardError;
use crate::services::Dashboard;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshQuery {
    #[serde(default)]
    pub refresh: bool,
}

fn to_app_error(error: DashboardError) -> AppError {
    match error {
        DashboardError::NotSignedIn => AppError::Auth(error.to_string()),
        DashboardError::WrongRole(_) => AppError::Forbidden(error.to_string()),
        DashboardError::Api(ApiError::Auth(message)) => AppError::Auth(message),
        DashboardError::Api(ApiError::NotFound(path)) => AppError::NotFound(path),
        DashboardError::Api(e) => AppError::Upstream(e.to_string()),
    }
}

#[axum::debug_handler]
pub async fn get_badges(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>, AppError> {
    let counts = if query.refresh {
        dashboard.refresh_badges().await
    } else {
        dashboard.badges().await
    }
    .map_err(to_app_error)?;

    Ok(Json(json!(counts)))
}

#[axum::debug_handler]
pub async fn get_doctor_readiness(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>, AppError> {
    let readiness = if query.refresh {
        dashboard.refresh_readiness().await
    } else {
        dashboard.readiness().await
    }
    .map_err(to_app_error)?;

    Ok(Json(json!({
        "ready": readiness.is_ready(),
        "has_bank_account": readiness.has_bank_account,
        "has_pricing": readiness.has_pricing,
        "online_fee": readiness.online_fee,
        "in_person_fee": readiness.in_person_fee
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_layout(
    State(dashboard): State<Arc<Dashboard>>,
    Query(query): Query<RefreshQuery>,
) -> Result<Json<Value>, AppError> {
    let layout = if query.refresh {
        dashboard.load_layout().await
    } else {
        dashboard.layout().await
    }
    .map_err(to_app_error)?;

    Ok(Json(json!(layout)))
}
