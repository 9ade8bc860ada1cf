//! Request and Response models for the feast finder API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{
    AiOptions, AiProcessRequest, CountryQuery, CountryRequest, ExternalDataQuery, RecipeQuery,
    RecipeRequest, ValidAiProcess,
};
pub use responses::{ApiResponse, HealthResponse, Metadata, StatsResponse};
