//! Business logic services

pub mod refresh;

pub use refresh::RefreshPipeline;
