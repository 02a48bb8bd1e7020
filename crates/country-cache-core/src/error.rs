//! Error types for country-cache

use thiserror::Error;

/// Main error type for country-cache
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Country API request failed: {0}")]
    CountryUpstream(String),

    #[error("Exchange-rate API request failed: {0}")]
    RatesUpstream(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Country not found")]
    NotFound,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Summary render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;
