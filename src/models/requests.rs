//! Request DTOs for the feast finder API
//!
//! Fields are optional at the serde level so that a missing field produces
//! the same validation message as an empty one.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::culture::SearchMode;
use crate::error::{AppError, Result};

fn required(value: Option<&str>, message: &str) -> Result<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

fn parse_mode(mode: Option<&str>) -> Result<SearchMode> {
    mode.map_or(Ok(SearchMode::Fast), |m| m.parse())
}

/// Request body for POST /api/dishes and POST /api/cultural-data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountryRequest {
    pub country: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// A validated country request.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryQuery {
    /// Trimmed country name as typed by the caller
    pub country: String,
    pub mode: SearchMode,
}

impl CountryRequest {
    /// Validates the request data
    pub fn validate(&self) -> Result<CountryQuery> {
        Ok(CountryQuery {
            country: required(self.country.as_deref(), "Country name is required")?,
            mode: parse_mode(self.mode.as_deref())?,
        })
    }
}

/// Request body for POST /api/recipe
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeRequest {
    pub country: Option<String>,
    pub dish_name: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipeQuery {
    pub country: String,
    pub dish_name: String,
    pub mode: SearchMode,
}

impl RecipeRequest {
    pub fn validate(&self) -> Result<RecipeQuery> {
        Ok(RecipeQuery {
            country: required(self.country.as_deref(), "Country name is required")?,
            dish_name: required(self.dish_name.as_deref(), "Dish name is required")?,
            mode: parse_mode(self.mode.as_deref())?,
        })
    }
}

/// Query string for GET/POST /api/external-data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDataQuery {
    pub source_id: Option<String>,
    pub endpoint: Option<String>,
    /// JSON object of string parameters, GET only
    pub params: Option<String>,
}

impl ExternalDataQuery {
    pub fn source_id(&self) -> Result<String> {
        required(self.source_id.as_deref(), "sourceId is required")
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref().filter(|e| !e.is_empty())
    }

    /// Decodes `params`; `None` when absent.
    pub fn parsed_params(&self) -> Result<Option<HashMap<String, String>>> {
        match self.params.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => serde_json::from_str(raw).map(Some).map_err(|_| {
                AppError::Validation("Invalid params format. Must be valid JSON".to_string())
            }),
        }
    }
}

/// Optional overrides for an AI request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Request body for POST /api/ai/process
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiProcessRequest {
    pub service_id: Option<String>,
    pub prompt: Option<Value>,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub options: Option<AiOptions>,
}

#[derive(Debug, Clone)]
pub struct ValidAiProcess {
    pub service_id: String,
    pub prompt: String,
    pub context: Option<Value>,
    pub options: AiOptions,
}

impl AiProcessRequest {
    pub fn validate(self) -> Result<ValidAiProcess> {
        let service_id = required(self.service_id.as_deref(), "serviceId is required")?;
        let prompt = match self.prompt {
            Some(Value::String(p)) if !p.trim().is_empty() => p,
            _ => {
                return Err(AppError::Validation(
                    "prompt is required and must be a non-empty string".to_string(),
                ))
            }
        };
        Ok(ValidAiProcess {
            service_id,
            prompt,
            context: self.context,
            options: self.options.unwrap_or_default(),
        })
    }
}
