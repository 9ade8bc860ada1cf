//! Error types for the feast finder service
//!
//! Provides unified error handling using thiserror. Every variant knows its
//! wire code, its HTTP status and whether a caller may retry it.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::cache::current_timestamp_ms;
use crate::models::{ApiResponse, Metadata};

// == Error Code ==
/// Error kind reported in the `error.code` field of the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    ExternalServiceError,
    AuthenticationError,
    RateLimitExceeded,
    TimeoutError,
    ServiceUnavailable,
    InternalError,
}

// == App Error Enum ==
/// Unified error type for the service.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Caller supplied bad input
    #[error("{0}")]
    Validation(String),

    /// Local rate limit rejected the call
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited {
        /// Unix milliseconds at which the oldest counted request ages out
        reset_at_ms: u64,
    },

    /// Outbound call missed its deadline
    #[error("{0}")]
    Timeout(String),

    /// Connection refused, DNS failure or broken transport
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-2xx status
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// Upstream failure already shaped for the boundary
    #[error("{message}")]
    ExternalService { message: String, retryable: bool },

    /// Upstream rejected our credentials
    #[error("{0}")]
    Authentication(String),

    /// Upstream answered but the body was malformed or failed validation
    #[error("{0}")]
    InvalidResponse(String),

    /// A dependency is down and there is no fallback
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Required configuration is missing
    #[error("{0}")]
    NotConfigured(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wire code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) => ErrorCode::ValidationError,
            AppError::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            AppError::Timeout(_) => ErrorCode::TimeoutError,
            AppError::Network(_)
            | AppError::Upstream { .. }
            | AppError::ExternalService { .. }
            | AppError::InvalidResponse(_) => ErrorCode::ExternalServiceError,
            AppError::Authentication(_) => ErrorCode::AuthenticationError,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            AppError::NotConfigured(_) | AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether repeating the same call could succeed.
    ///
    /// Decided by variant and status code only, never by message text.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::RateLimited { .. }
            | AppError::Timeout(_)
            | AppError::Network(_)
            | AppError::ServiceUnavailable(_) => true,
            AppError::Upstream { status, .. } => *status == 429 || *status >= 500,
            AppError::ExternalService { retryable, .. } => *retryable,
            AppError::Validation(_)
            | AppError::Authentication(_)
            | AppError::InvalidResponse(_)
            | AppError::NotConfigured(_)
            | AppError::Internal(_) => false,
        }
    }

    /// HTTP status used when this error reaches the boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classifies a reqwest transport error.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() || err.is_request() {
            AppError::Network(err.to_string())
        } else if err.is_decode() {
            AppError::InvalidResponse(format!("Failed to decode response body: {}", err))
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidResponse(format!("Invalid JSON: {}", err))
    }
}

// == Error Body ==
/// The `error` object of a failed response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Human readable message
    pub message: String,
    /// Error kind
    pub code: ErrorCode,
    /// Whether the caller may retry
    pub retryable: bool,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            message: err.to_string(),
            code: err.code(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(format!(
            "Invalid request: {}. Please check your request format.",
            rejection.body_text()
        ))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl AppError {
    /// Builds the failure envelope with route-specific metadata.
    pub fn into_response_with(self, metadata: Metadata) -> Response {
        let status = self.status_code();
        let body = Json(ApiResponse::<()>::failure(ErrorBody::from(&self)).with_metadata(metadata));
        let mut response = (status, body).into_response();

        if let AppError::RateLimited { reset_at_ms } = self {
            let headers = response.headers_mut();
            if let Ok(value) = HeaderValue::from_str(&reset_at_ms.to_string()) {
                headers.insert("x-ratelimit-reset", value);
            }
            let wait_secs = reset_at_ms
                .saturating_sub(current_timestamp_ms())
                .div_ceil(1000);
            if let Ok(value) = HeaderValue::from_str(&wait_secs.to_string()) {
                headers.insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(Metadata::now())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the service.
pub type Result<T> = std::result::Result<T, AppError>;
