//! Authentication headers for configured upstreams.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use tracing::warn;

use crate::config::{AuthMethod, AuthenticationConfig};

const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Returns `headers` with the credentials described by `config` added.
///
/// A method whose credential is missing adds nothing. Header names or values
/// that are not valid HTTP are skipped with a warning.
pub fn apply_authentication(config: &AuthenticationConfig, mut headers: HeaderMap) -> HeaderMap {
    match config.method {
        AuthMethod::ApiKey => {
            if let Some(key) = config.api_key.as_deref() {
                let name = config
                    .header_name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_API_KEY_HEADER);
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(key),
                ) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => warn!(header = name, "skipping invalid API key header"),
                }
            }
        }
        AuthMethod::Bearer => {
            if let Some(token) = config.bearer_token.as_deref() {
                insert_authorization(&mut headers, format!("Bearer {}", token));
            }
        }
        AuthMethod::Basic => {
            if let (Some(user), Some(pass)) = (config.username.as_deref(), config.password.as_deref()) {
                insert_authorization(&mut headers, basic_credentials(user, pass));
            }
        }
        AuthMethod::None => {}
    }
    headers
}

/// `Basic <base64(user:pass)>`
pub fn basic_credentials(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

fn insert_authorization(headers: &mut HeaderMap, value: String) {
    match HeaderValue::from_str(&value) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Err(_) => warn!("skipping invalid Authorization header"),
    }
}
