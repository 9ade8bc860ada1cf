//! Configured AI services behind `/api/ai/process`.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::clients::auth::apply_authentication;
use crate::clients::fetch::{ensure_success, join_url, with_deadline};
use crate::config::AiServiceConfig;
use crate::error::{AppError, Result};

const DEMO_PROVIDER: &str = "demo";
const DEMO_PREVIEW_CHARS: usize = 50;

// == Request and Result ==
/// A prompt plus optional overrides of the service defaults.
#[derive(Debug, Clone, Default)]
pub struct AiRequest {
    pub prompt: String,
    pub context: Option<Value>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiResult {
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl AiResult {
    /// Reads `result`, then `text`, then falls back to the raw JSON.
    fn from_body(body: Value) -> Self {
        let tokens_used = body
            .get("tokensUsed")
            .and_then(Value::as_u64)
            .or_else(|| body.pointer("/usage/total_tokens").and_then(Value::as_u64));
        let result = ["result", "text"]
            .iter()
            .find_map(|field| {
                body.get(field)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());
        Self {
            result,
            tokens_used,
        }
    }
}

// == Demo Provider ==
fn demo_reply(prompt: &str) -> AiResult {
    let preview: String = prompt.chars().take(DEMO_PREVIEW_CHARS).collect();
    AiResult {
        result: format!("[Demo AI Response] Processed: \"{}...\"", preview),
        tokens_used: Some((prompt.chars().count() / 4) as u64),
    }
}

// == AI Service Client ==
#[derive(Debug, Clone)]
pub struct AiServiceClient {
    http: reqwest::Client,
}

impl AiServiceClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Sends `request` to `service`.
    ///
    /// The `demo` provider answers locally. Every other provider failure is
    /// reported as a retryable external service error.
    pub async fn process(&self, service: &AiServiceConfig, request: AiRequest) -> Result<AiResult> {
        if service.provider == DEMO_PROVIDER {
            debug!(service = %service.id, "demo provider, answering locally");
            return Ok(demo_reply(&request.prompt));
        }

        let url = join_url(&service.endpoint_url, Some("process"));
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let headers = apply_authentication(&service.authentication, headers);
        let body = json!({
            "prompt": request.prompt,
            "context": request.context,
            "model": service.model,
            "temperature": request.temperature.unwrap_or(service.temperature),
            "max_tokens": request.max_tokens.unwrap_or(service.max_tokens),
        });
        let call = self.http.post(&url).headers(headers).json(&body);

        let outcome = with_deadline(service.timeout(), "AI service request", async {
            let response = call.send().await.map_err(AppError::from_transport)?;
            let response = ensure_success(response, "AI service")?;
            response
                .json::<Value>()
                .await
                .map_err(AppError::from_transport)
        })
        .await;

        match outcome {
            Ok(body) => Ok(AiResult::from_body(body)),
            Err(err) => {
                warn!(service = %service.id, provider = %service.provider, error = %err, "AI request failed");
                Err(AppError::ExternalService {
                    message: err.to_string(),
                    retryable: true,
                })
            }
        }
    }
}
