//! HTTP surface: report downloads, previews, filters and health.

pub mod auth;
pub mod error;
pub mod extract;
pub mod filter_cache;
pub mod filters;
pub mod middleware;
pub mod reports;
pub mod routes;
pub mod status;

pub use routes::*;
