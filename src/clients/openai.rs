//! Chat completion client used for dishes, carols and recipes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::clients::fetch::with_deadline;
use crate::config::OpenAiConfig;
use crate::error::{AppError, Result};

// == Chat Model ==
/// A model that answers a prompt with a JSON document.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends `prompt` to `model` and returns the raw JSON text of the reply.
    async fn complete_json(&self, model: &str, prompt: &str) -> Result<String>;
}

// == Wire Types ==
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

// == Status Mapping ==
/// Maps a provider status to a boundary error.
fn classify_status(status: u16) -> AppError {
    match status {
        429 => AppError::Upstream {
            status,
            message: "Service is temporarily unavailable. Please try again in a moment."
                .to_string(),
        },
        401 => AppError::Authentication(
            "Service configuration error. Please contact support.".to_string(),
        ),
        500 | 503 => AppError::Upstream {
            status,
            message: "Unable to connect to cultural data service. Please try again later."
                .to_string(),
        },
        _ => AppError::Upstream {
            status,
            message: format!("Failed to query cultural data: provider returned {}", status),
        },
    }
}

// == OpenAI Client ==
/// OpenAI-compatible `/chat/completions` client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// A missing API key is reported on the first call, not here.
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    fn api_key(&self) -> Result<&str> {
        self.config.api_key.as_deref().ok_or_else(|| {
            AppError::NotConfigured("OPENAI_API_KEY environment variable is required".to_string())
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete_json(&self, model: &str, prompt: &str) -> Result<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = json!({
            "model": model,
            "messages": [ChatMessage { role: "user", content: prompt }],
            "response_format": { "type": "json_object" },
        });

        debug!(model, prompt_len = prompt.len(), "chat completion request");
        let request = self.http.post(&url).bearer_auth(api_key).json(&body);

        let completion = with_deadline(self.config.timeout, "Chat completion", async {
            let response = request.send().await.map_err(AppError::from_transport)?;
            let status = response.status();
            if !status.is_success() {
                return Err(classify_status(status.as_u16()));
            }
            response
                .json::<ChatCompletion>()
                .await
                .map_err(AppError::from_transport)
        })
        .await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AppError::InvalidResponse("OpenAI API returned empty response".to_string()))
    }
}
