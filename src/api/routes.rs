//! API Routes
//!
//! Configures the Axum router with all feast finder endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    ai_process_handler, countries_handler, cultural_data_handler, dishes_handler,
    external_data_get_handler, external_data_post_handler, health_handler, recipe_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/health` - Health check
/// - `GET /api/stats` - Cache statistics
/// - `GET /api/countries` - Sorted country names
/// - `POST /api/dishes` - Christmas dishes for a country
/// - `POST /api/cultural-data` - Dishes, carol and carol link
/// - `POST /api/recipe` - Step-by-step recipe for a dish
/// - `GET|POST /api/external-data` - Proxy to a configured data source
/// - `POST /api/ai/process` - Rate-limited call to a configured AI service
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/countries", get(countries_handler))
        .route("/api/dishes", post(dishes_handler))
        .route("/api/cultural-data", post(cultural_data_handler))
        .route("/api/recipe", post(recipe_handler))
        .route(
            "/api/external-data",
            get(external_data_get_handler).post(external_data_post_handler),
        )
        .route("/api/ai/process", post(ai_process_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
