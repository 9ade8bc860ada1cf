//! API Module
//!
//! HTTP handlers and routing for the feast finder REST API.
//!
//! # Endpoints
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/stats` - Cache statistics
//! - `GET /api/countries` - Country list
//! - `POST /api/dishes`, `POST /api/cultural-data`, `POST /api/recipe`
//! - `GET|POST /api/external-data` - External data proxy
//! - `POST /api/ai/process` - AI service calls

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
