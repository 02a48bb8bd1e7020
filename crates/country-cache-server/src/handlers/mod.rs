//! HTTP handlers

pub mod countries;
mod error;
pub mod status;

pub use error::ApiError;

/// Liveness probe
pub async fn health() -> &'static str {
    "OK"
}
