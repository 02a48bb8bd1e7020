//! Status endpoint

use crate::handlers::ApiError;
use crate::AppState;
use axum::{extract::State, Json};
use serde_json::json;

/// GET /status - aggregate over the whole table
pub async fn status(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let status = state.db.status().await?;
    Ok(Json(json!({
        "total_countries": status.total,
        "last_refreshed_at": status.last_refreshed_at,
    })))
}
