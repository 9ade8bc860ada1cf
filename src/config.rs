//! Configuration Module
//!
//! Handles loading and managing server configuration from environment
//! variables, plus the built-in external data sources and AI services.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rate_limit::RateLimitConfig;

const DEFAULT_PORT: u16 = 3000;

// == Environment ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" => Some(Environment::Development),
            "production" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

// == Authentication ==
/// How credentials are attached to outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthMethod {
    #[default]
    None,
    ApiKey,
    Bearer,
    Basic,
}

/// Credentials for an external data source or AI service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationConfig {
    pub method: AuthMethod,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Header used for `apiKey`; `X-API-Key` when unset
    pub header_name: Option<String>,
}

impl AuthenticationConfig {
    /// No credentials attached.
    pub fn none() -> Self {
        Self::default()
    }
}

// == External Data Source ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataFormat {
    #[default]
    Json,
    Xml,
    Csv,
}

/// A configured upstream reachable through the external-data routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalDataSource {
    pub id: String,
    pub name: String,
    pub endpoint_url: String,
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    #[serde(default)]
    pub data_format: DataFormat,
    /// 0 means fetched on demand
    #[serde(default)]
    pub refresh_frequency_ms: u64,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
}

impl ExternalDataSource {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// == AI Service ==
/// A configured AI provider reachable through `/api/ai/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiServiceConfig {
    pub id: String,
    /// `demo` answers locally; anything else is called over HTTP
    pub provider: String,
    pub endpoint_url: String,
    #[serde(default)]
    pub authentication: AuthenticationConfig,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    pub timeout_ms: u64,
}

impl AiServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// == Provider Settings ==
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub api_base_url: String,
    pub timeout: Duration,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: "https://accounts.spotify.com/api/token".to_string(),
            api_base_url: "https://api.spotify.com/v1".to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    pub environment: Environment,
    pub openai: OpenAiConfig,
    pub spotify: SpotifyConfig,
    /// REST Countries endpoint returning `name` fields
    pub countries_url: String,
    pub countries_timeout: Duration,
    /// Base unit for every backoff schedule
    pub retry_base_delay: Duration,
    pub external_data_sources: Vec<ExternalDataSource>,
    pub ai_services: Vec<AiServiceConfig>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port, 1024-65535 (default: 3000)
    /// - `APP_ENV` - development | production | test (default: development)
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`
    /// - `SPOTIFY_CLIENT_ID`, `SPOTIFY_CLIENT_SECRET`, `SPOTIFY_TOKEN_URL`,
    ///   `SPOTIFY_API_BASE_URL`
    /// - `COUNTRIES_URL`
    /// - `RETRY_BASE_DELAY_MS` - backoff unit in milliseconds (default: 1000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_port = match env::var("PORT").ok() {
            Some(raw) => parse_port(&raw).unwrap_or_else(|| {
                warn!("Invalid server port {}, using default {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => defaults.server_port,
        };

        let environment = env::var("APP_ENV")
            .ok()
            .and_then(|v| Environment::parse(&v))
            .unwrap_or(defaults.environment);

        let openai = OpenAiConfig {
            api_key: non_empty_var("OPENAI_API_KEY"),
            base_url: non_empty_var("OPENAI_BASE_URL").unwrap_or(defaults.openai.base_url),
            timeout: defaults.openai.timeout,
        };

        let spotify = SpotifyConfig {
            client_id: non_empty_var("SPOTIFY_CLIENT_ID"),
            client_secret: non_empty_var("SPOTIFY_CLIENT_SECRET"),
            token_url: non_empty_var("SPOTIFY_TOKEN_URL").unwrap_or(defaults.spotify.token_url),
            api_base_url: non_empty_var("SPOTIFY_API_BASE_URL")
                .unwrap_or(defaults.spotify.api_base_url),
            timeout: defaults.spotify.timeout,
        };

        let retry_base_delay = env::var("RETRY_BASE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_base_delay);

        let config = Self {
            server_port,
            environment,
            openai,
            spotify,
            countries_url: non_empty_var("COUNTRIES_URL").unwrap_or(defaults.countries_url),
            countries_timeout: defaults.countries_timeout,
            retry_base_delay,
            external_data_sources: defaults.external_data_sources,
            ai_services: defaults.ai_services,
        };

        if config.external_data_sources.is_empty() {
            warn!("No external data sources configured");
        }
        if config.ai_services.is_empty() {
            warn!("No AI services configured");
        }

        config
    }

    /// Finds an external data source by id.
    pub fn external_source(&self, id: &str) -> Option<&ExternalDataSource> {
        self.external_data_sources.iter().find(|s| s.id == id)
    }

    /// Finds an AI service by id.
    pub fn ai_service(&self, id: &str) -> Option<&AiServiceConfig> {
        self.ai_services.iter().find(|s| s.id == id)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            environment: Environment::Development,
            openai: OpenAiConfig::default(),
            spotify: SpotifyConfig::default(),
            countries_url: "https://restcountries.com/v3.1/all?fields=name".to_string(),
            countries_timeout: Duration::from_secs(10),
            retry_base_delay: Duration::from_millis(1000),
            external_data_sources: vec![ExternalDataSource {
                id: "sample-api".to_string(),
                name: "Sample API".to_string(),
                endpoint_url: "https://jsonplaceholder.typicode.com".to_string(),
                authentication: AuthenticationConfig::none(),
                data_format: DataFormat::Json,
                refresh_frequency_ms: 0,
                timeout_ms: 5000,
                retry_attempts: 3,
            }],
            ai_services: vec![AiServiceConfig {
                id: "demo-ai".to_string(),
                provider: "demo".to_string(),
                endpoint_url: "https://api.example.com/ai".to_string(),
                authentication: AuthenticationConfig::none(),
                model: "demo-model".to_string(),
                max_tokens: 1000,
                temperature: 0.7,
                rate_limit: RateLimitConfig::default(),
                timeout_ms: 30_000,
            }],
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port >= 1024)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
