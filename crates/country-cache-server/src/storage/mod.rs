//! Storage layer
//!
//! Uses SQLite (embedded) behind a bounded sqlx connection pool.

pub mod db;

pub use db::{Database, StoreStatus};
