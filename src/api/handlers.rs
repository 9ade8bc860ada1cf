//! API Handlers
//!
//! HTTP request handlers for each feast finder endpoint. Input is validated
//! before any cache or upstream work.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::cache::{shared_cache, SharedCache};
use crate::clients::{
    AiRequest, AiServiceClient, ChatModel, CountriesClient, ExternalFetcher, HttpMethod,
    OpenAiClient, SpotifyClient,
};
use crate::config::{Config, ExternalDataSource};
use crate::culture::{
    query_cultural_data_with_retry, query_recipe_with_retry, CountryCulturalData, DishesResponse,
    Recipe,
};
use crate::error::{AppError, Result};
use crate::models::{
    AiProcessRequest, ApiResponse, CountryRequest, ExternalDataQuery, HealthResponse, Metadata,
    RecipeRequest, StatsResponse,
};
use crate::rate_limit::{shared_rate_limiter, RateLimitDecision, SharedRateLimiter};

/// Dishes, cultural data and recipes stay cached for 20 minutes.
const CULTURE_TTL_MS: u64 = 20 * 60 * 1000;

type ApiResult<T> = Result<Json<ApiResponse<T>>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Process-wide TTL cache
    pub cache: SharedCache,
    pub rate_limiter: SharedRateLimiter,
    pub countries: CountriesClient,
    pub spotify: SpotifyClient,
    pub fetcher: ExternalFetcher,
    pub ai_services: AiServiceClient,
    /// Chat model behind dishes, carols and recipes
    pub model: Arc<dyn ChatModel>,
}

impl AppState {
    /// Creates the state from configuration, wiring every client to one
    /// HTTP connection pool and one cache.
    pub fn from_config(config: Config) -> Self {
        let http = reqwest::Client::new();
        let cache = shared_cache();

        Self {
            countries: CountriesClient::new(
                http.clone(),
                config.countries_url.clone(),
                config.countries_timeout,
                cache.clone(),
            ),
            spotify: SpotifyClient::new(http.clone(), config.spotify.clone(), cache.clone()),
            fetcher: ExternalFetcher::new(http.clone(), config.retry_base_delay),
            ai_services: AiServiceClient::new(http.clone()),
            model: Arc::new(OpenAiClient::new(http, config.openai.clone())),
            rate_limiter: shared_rate_limiter(),
            config: Arc::new(config),
            cache,
        }
    }

    /// Replaces the chat model.
    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = model;
        self
    }
}

/// Wraps `outcome` in the envelope, adding the elapsed time under `key`.
fn timed_response<T: Serialize>(
    outcome: Result<T>,
    metadata: Metadata,
    key: &str,
    started: Instant,
) -> Response {
    let metadata = metadata.with(key, started.elapsed().as_millis() as u64);
    match outcome {
        Ok(data) => Json(ApiResponse::success(data).with_metadata(metadata)).into_response(),
        Err(err) => err.into_response_with(metadata),
    }
}

/// Handler for GET /api/health
pub async fn health_handler() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse::healthy()))
}

/// Handler for GET /api/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<ApiResponse<StatsResponse>> {
    let stats = state.cache.read().await.stats();
    Json(ApiResponse::success(StatsResponse::from(stats)))
}

/// Handler for GET /api/countries
pub async fn countries_handler(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let countries = state.countries.list().await?;
    Ok(Json(ApiResponse::success(countries)))
}

/// Handler for POST /api/dishes
///
/// Returns the country's Christmas dishes. A reply that names no dish at all
/// is an error here even if it carried a carol.
pub async fn dishes_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CountryRequest>, JsonRejection>,
) -> ApiResult<DishesResponse> {
    let Json(req) = payload?;
    let query = req.validate()?;
    let country = state.countries.validate(&query.country).await?;

    let key = format!("dishes:{}", country.to_lowercase());
    if let Some(dishes) = state.cache.write().await.get_as::<DishesResponse>(&key) {
        debug!(%country, "dishes served from cache");
        return Ok(Json(ApiResponse::success(dishes)));
    }

    let data = query_cultural_data_with_retry(state.model.as_ref(), &country, query.mode).await?;
    if data.dishes.is_empty() {
        return Err(AppError::ExternalService {
            message: "No famous dishes found for this country. Please try another country."
                .to_string(),
            retryable: false,
        });
    }

    state.cache.write().await.set_as(key, &data.dishes, CULTURE_TTL_MS);
    Ok(Json(ApiResponse::success(data.dishes)))
}

/// Handler for POST /api/cultural-data
///
/// Dishes and carol for a country, plus a Spotify link for the carol when
/// one can be found.
pub async fn cultural_data_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CountryRequest>, JsonRejection>,
) -> ApiResult<CountryCulturalData> {
    let Json(req) = payload?;
    let query = req.validate()?;
    let country = state.countries.validate(&query.country).await?;

    let key = format!("cultural-data:{}:{}", country.to_lowercase(), query.mode);
    if let Some(data) = state.cache.write().await.get_as::<CountryCulturalData>(&key) {
        debug!(%country, mode = %query.mode, "cultural data served from cache");
        return Ok(Json(ApiResponse::success(data)));
    }

    let mut data =
        query_cultural_data_with_retry(state.model.as_ref(), &country, query.mode).await?;
    if let Some(carol) = &data.carol {
        data.spotify_url = state.spotify.search_carol(&carol.name).await;
    }

    state.cache.write().await.set_as(key, &data, CULTURE_TTL_MS);
    Ok(Json(ApiResponse::success(data)))
}

fn recipe_cache_key(dish: &str, country: &str, mode: &str) -> String {
    let dish = dish
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("recipe:{}:{}:{}", dish, country.to_lowercase(), mode)
}

/// Handler for POST /api/recipe
pub async fn recipe_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RecipeRequest>, JsonRejection>,
) -> ApiResult<Recipe> {
    let Json(req) = payload?;
    let query = req.validate()?;

    let key = recipe_cache_key(&query.dish_name, &query.country, query.mode.as_str());
    if let Some(recipe) = state.cache.write().await.get_as::<Recipe>(&key) {
        debug!(dish = %query.dish_name, "recipe served from cache");
        return Ok(Json(ApiResponse::success(recipe)));
    }

    let recipe = query_recipe_with_retry(
        state.model.as_ref(),
        &query.dish_name,
        &query.country,
        query.mode,
        state.config.retry_base_delay,
    )
    .await?;

    state.cache.write().await.set_as(key, &recipe, CULTURE_TTL_MS);
    Ok(Json(ApiResponse::success(recipe)))
}

fn resolve_source<'a>(config: &'a Config, query: &ExternalDataQuery) -> Result<&'a ExternalDataSource> {
    let id = query.source_id()?;
    config
        .external_source(&id)
        .ok_or_else(|| AppError::Validation(format!("External data source '{}' not found", id)))
}

fn source_metadata(query: &ExternalDataQuery) -> Metadata {
    match query.source_id.as_deref() {
        Some(id) if !id.is_empty() => Metadata::now().with("sourceId", id),
        _ => Metadata::now(),
    }
}

async fn get_external(state: &AppState, query: &ExternalDataQuery) -> Result<Value> {
    let source = resolve_source(&state.config, query)?;
    let params = query.parsed_params()?;
    state
        .fetcher
        .fetch_external_data(source, query.endpoint(), params.as_ref(), HttpMethod::Get, None)
        .await
}

async fn post_external(
    state: &AppState,
    query: &ExternalDataQuery,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Value> {
    let source = resolve_source(&state.config, query)?;
    let Json(body) = body.map_err(|_| {
        AppError::Validation("Invalid request body. Must be valid JSON".to_string())
    })?;
    state
        .fetcher
        .fetch_external_data(source, query.endpoint(), None, HttpMethod::Post, Some(&body))
        .await
}

/// Handler for GET /api/external-data
pub async fn external_data_get_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ExternalDataQuery>, QueryRejection>,
) -> Response {
    let started = Instant::now();
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };

    let outcome = get_external(&state, &query).await;
    timed_response(outcome, source_metadata(&query), "responseTime", started)
}

/// Handler for POST /api/external-data
pub async fn external_data_post_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ExternalDataQuery>, QueryRejection>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };

    let outcome = post_external(&state, &query, body).await;
    timed_response(outcome, source_metadata(&query), "responseTime", started)
}

async fn process_ai(
    state: &AppState,
    payload: std::result::Result<Json<AiProcessRequest>, JsonRejection>,
) -> Result<(Value, Metadata)> {
    let Json(req) = payload?;
    let req = req.validate()?;
    let service = state.config.ai_service(&req.service_id).ok_or_else(|| {
        AppError::Validation(format!("AI service '{}' not found", req.service_id))
    })?;

    let decision = state
        .rate_limiter
        .lock()
        .await
        .check(&service.id, &service.rate_limit);
    if let RateLimitDecision::Limited { reset_at_ms } = decision {
        info!(service = %service.id, reset_at_ms, "AI request rate limited");
        return Err(AppError::RateLimited { reset_at_ms });
    }

    let result = state
        .ai_services
        .process(
            service,
            AiRequest {
                prompt: req.prompt,
                context: req.context,
                temperature: req.options.temperature,
                max_tokens: req.options.max_tokens,
            },
        )
        .await?;

    let metadata = Metadata::now()
        .with("serviceId", &service.id)
        .with("model", &service.model)
        .with("tokensUsed", result.tokens_used);
    Ok((json!({ "result": result.result }), metadata))
}

/// Handler for POST /api/ai/process
pub async fn ai_process_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AiProcessRequest>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    match process_ai(&state, payload).await {
        Ok((data, metadata)) => timed_response(Ok(data), metadata, "processingTime", started),
        Err(err) => timed_response::<Value>(Err(err), Metadata::now(), "processingTime", started),
    }
}
