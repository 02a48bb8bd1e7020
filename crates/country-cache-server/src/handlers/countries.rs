//! Country endpoints

use crate::handlers::ApiError;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use country_cache_core::{CacheError, CountryFilter, SortKey, StoredCountry};
use serde::Deserialize;
use serde_json::json;

/// POST /countries/refresh - run the full pipeline, respond with the table
pub async fn refresh(State(state): State<AppState>) -> Result<Json<Vec<StoredCountry>>, ApiError> {
    let table = state.pipeline.run().await?;
    Ok(Json(table))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    region: Option<String>,
    currency: Option<String>,
    sort: Option<String>,
}

/// GET /countries?region=..&currency=..&sort=..
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<StoredCountry>>, ApiError> {
    let sort = query
        .sort
        .as_deref()
        .map(str::parse::<SortKey>)
        .transpose()?;

    let filter = CountryFilter {
        region: query.region,
        currency_code: query.currency,
    };

    let rows = state.db.list(&filter, sort).await?;
    Ok(Json(rows))
}

/// GET /countries/:name
pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StoredCountry>, ApiError> {
    let country = state
        .db
        .get_by_name(&name)
        .await?
        .ok_or(CacheError::NotFound)?;
    Ok(Json(country))
}

/// DELETE /countries/:name
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.db.delete_by_name(&name).await? {
        return Err(CacheError::NotFound.into());
    }
    Ok(Json(json!({ "message": "Country deleted successfully" })))
}

/// GET /countries/image - location of the rendered summary artifact
pub async fn image(State(state): State<AppState>) -> Response {
    match tokio::fs::try_exists(&state.image_path).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "image_path": state.image_path.display().to_string() })),
        )
            .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "summary image not found" })),
        )
            .into_response(),
    }
}
