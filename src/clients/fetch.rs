//! External Fetch With Retry
//!
//! Calls a configured external data source under a per-attempt deadline and
//! retries retryable failures with exponential backoff.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clients::auth::apply_authentication;
use crate::config::ExternalDataSource;
use crate::error::{AppError, Result};

/// HTTP verbs accepted by the external data routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }

    fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

/// Joins a base URL and an endpoint with exactly one `/` between them.
pub fn join_url(base: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) if !endpoint.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        ),
        _ => base.to_string(),
    }
}

/// `2^attempt * base`, attempt counted from 0.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Runs `fut` under `deadline`; an elapsed deadline becomes `AppError::Timeout`.
pub async fn with_deadline<T, F>(deadline: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} timed out after {}ms",
            what,
            deadline.as_millis()
        ))),
    }
}

/// Maps a non-2xx response to `AppError::Upstream`.
pub fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(AppError::Upstream {
            status: status.as_u16(),
            message: format!(
                "{} returned {}: {}",
                what,
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ),
        })
    }
}

// == External Fetcher ==
/// Retrying client for configured external data sources.
#[derive(Debug, Clone)]
pub struct ExternalFetcher {
    http: reqwest::Client,
    base_delay: Duration,
}

impl ExternalFetcher {
    /// `base_delay` is the backoff unit; attempt `n` waits `2^n * base_delay`.
    pub fn new(http: reqwest::Client, base_delay: Duration) -> Self {
        Self { http, base_delay }
    }

    /// Fetches JSON from `source`.
    ///
    /// Makes at most `retry_attempts + 1` attempts. Only retryable errors
    /// (timeouts, connection failures, 5xx and 429) are retried; anything
    /// else is returned at once. The last error is returned when attempts run
    /// out.
    pub async fn fetch_external_data(
        &self,
        source: &ExternalDataSource,
        endpoint: Option<&str>,
        params: Option<&HashMap<String, String>>,
        method: HttpMethod,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = join_url(&source.endpoint_url, endpoint);
        let mut attempt = 0u32;

        loop {
            debug!(source = %source.id, %url, attempt, "external fetch");
            match self.attempt(source, &url, params, method, body).await {
                Ok(data) => return Ok(data),
                Err(err) => {
                    if attempt >= source.retry_attempts || !err.is_retryable() {
                        warn!(
                            source = %source.id,
                            attempt,
                            retryable = err.is_retryable(),
                            error = %err,
                            "external fetch failed"
                        );
                        return Err(err);
                    }

                    let delay = backoff_delay(self.base_delay, attempt);
                    warn!(
                        source = %source.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "external fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(
        &self,
        source: &ExternalDataSource,
        url: &str,
        params: Option<&HashMap<String, String>>,
        method: HttpMethod,
        body: Option<&Value>,
    ) -> Result<Value> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let headers = apply_authentication(&source.authentication, headers);

        let mut request = self
            .http
            .request(method.as_reqwest(), url)
            .headers(headers);
        if method == HttpMethod::Get {
            if let Some(params) = params {
                request = request.query(params);
            }
        }
        if method.carries_body() {
            if let Some(body) = body {
                request = request.json(body);
            }
        }

        let what = format!("Request to {}", source.name);
        with_deadline(source.timeout(), &what, async {
            let response = request.send().await.map_err(AppError::from_transport)?;
            let response = ensure_success(response, "External API")?;
            response
                .json::<Value>()
                .await
                .map_err(AppError::from_transport)
        })
        .await
    }
}
