//! Country Cache - Core Library
//!
//! Domain types, upstream API clients, and the merge/estimate engine
//! for the country-cache service.

pub mod clients;
pub mod error;
pub mod merge;
pub mod types;

pub use clients::*;
pub use error::*;
pub use merge::*;
pub use types::*;
