//! Response DTOs for the feast finder API
//!
//! Every route answers with the same envelope:
//! `{success, data?, error?, metadata: {timestamp, ...}}`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::{current_timestamp_ms, CacheStats};
use crate::error::ErrorBody;

/// Envelope metadata. `timestamp` is always present; routes add their own
/// keys (response time, source id, model, ...).
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    /// Unix milliseconds
    pub timestamp: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Metadata {
    pub fn now() -> Self {
        Self {
            timestamp: current_timestamp_ms(),
            extra: Map::new(),
        }
    }

    /// Adds a key. Values that fail to serialize are dropped.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.extra.insert(key.to_string(), value);
        }
        self
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::now()
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub metadata: Metadata,
}

impl<T> ApiResponse<T> {
    /// Successful envelope around `data`.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: Metadata::now(),
        }
    }

    /// Failed envelope carrying `error`.
    pub fn failure(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            metadata: Metadata::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Response body for the health endpoint (GET /api/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub version: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Response body for the stats endpoint (GET /api/stats)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub total_entries: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
        }
    }
}
