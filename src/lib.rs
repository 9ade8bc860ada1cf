//! Feast Finder - Christmas dishes, carols and recipes by country
//!
//! An HTTP service that asks a chat model for a country's holiday food and
//! music, with TTL caching, per-service rate limiting and retrying clients
//! for the upstreams it depends on.

pub mod api;
pub mod cache;
pub mod clients;
pub mod config;
pub mod culture;
pub mod error;
pub mod models;
pub mod rate_limit;

#[cfg(test)]
mod test_support;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AppError, Result};
