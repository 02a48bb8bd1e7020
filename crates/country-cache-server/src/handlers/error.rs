//! Error-to-response mapping for the HTTP boundary

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use country_cache_core::CacheError;
use serde_json::json;

/// Wrapper carrying typed errors across the handler boundary.
///
/// Not-found and validation errors keep their detail; everything else
/// collapses to a generic body with the cause logged server-side.
#[derive(Debug)]
pub struct ApiError(pub CacheError);

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            CacheError::NotFound => (StatusCode::NOT_FOUND, "Country not found".to_string()),
            CacheError::Validation(detail) => (StatusCode::BAD_REQUEST, detail.clone()),
            CacheError::CountryUpstream(_) | CacheError::RatesUpstream(_) => {
                tracing::error!("Upstream failure: {}", self.0);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "External data source unavailable".to_string(),
                )
            }
            other => {
                tracing::error!("Request failed: {other}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
