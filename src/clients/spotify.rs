//! Spotify track lookup for carols.
//!
//! Uses the client-credentials flow. Lookup failures are logged and reported
//! as "no link"; they never fail the request that asked for the carol.

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::{current_timestamp_ms, SharedCache};
use crate::clients::auth::basic_credentials;
use crate::clients::fetch::{ensure_success, with_deadline};
use crate::config::SpotifyConfig;
use crate::error::{AppError, Result};

// == Constants ==
const TOKEN_CACHE_KEY: &str = "spotify-access-token";
const URL_CACHE_TTL_MS: u64 = 20 * 60 * 1000;
/// Tokens are refreshed this long before they actually expire.
const TOKEN_EXPIRY_BUFFER_MS: u64 = 60_000;
const OPEN_SPOTIFY_PREFIX: &str = "https://open.spotify.com/";

fn url_cache_key(carol: &str) -> String {
    format!("spotify-url:{}", carol.to_lowercase())
}

// == Access Token ==
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccessToken {
    access_token: String,
    expires_in: u64,
    #[serde(default)]
    obtained_at: u64,
}

impl AccessToken {
    fn is_usable_at(&self, now: u64) -> bool {
        let lifetime = self.expires_in.saturating_mul(1000);
        now.saturating_sub(self.obtained_at) < lifetime.saturating_sub(TOKEN_EXPIRY_BUFFER_MS)
    }
}

// == Search Response ==
#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct Track {
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

/// First track's link, if it points at open.spotify.com.
fn extract_track_url(response: SearchResponse) -> Option<String> {
    response
        .tracks?
        .items
        .into_iter()
        .next()?
        .external_urls?
        .spotify
        .filter(|url| url.starts_with(OPEN_SPOTIFY_PREFIX))
}

// == Spotify Client ==
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: reqwest::Client,
    config: SpotifyConfig,
    cache: SharedCache,
}

impl SpotifyClient {
    pub fn new(http: reqwest::Client, config: SpotifyConfig, cache: SharedCache) -> Self {
        Self { http, config, cache }
    }

    // == Search Carol ==
    /// Looks up a track link for `carol`. Never fails; `None` means no link.
    pub async fn search_carol(&self, carol: &str) -> Option<String> {
        let name = carol.trim();
        if name.is_empty() {
            return None;
        }

        let key = url_cache_key(name);
        if let Some(url) = self.cache.write().await.get_as::<String>(&key) {
            return Some(url);
        }

        let found = match self.search_with_fresh_token(name).await {
            Err(AppError::Authentication(_)) => {
                debug!("spotify token rejected, fetching a new one");
                self.cache.write().await.delete(TOKEN_CACHE_KEY);
                self.search_with_fresh_token(name).await
            }
            other => other,
        };

        match found {
            Ok(Some(url)) => {
                self.cache.write().await.set_as(key, &url, URL_CACHE_TTL_MS);
                Some(url)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(carol = name, error = %err, "spotify lookup failed");
                None
            }
        }
    }

    async fn search_with_fresh_token(&self, name: &str) -> Result<Option<String>> {
        let token = self.access_token().await?;
        self.search(name, &token.access_token).await
    }

    // == Token Exchange ==
    async fn access_token(&self) -> Result<AccessToken> {
        let now = current_timestamp_ms();
        if let Some(token) = self.cache.write().await.get_as::<AccessToken>(TOKEN_CACHE_KEY) {
            if token.is_usable_at(now) {
                return Ok(token);
            }
        }

        let (client_id, client_secret) = match (&self.config.client_id, &self.config.client_secret)
        {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                return Err(AppError::NotConfigured(
                    "SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET environment variables are required"
                        .to_string(),
                ))
            }
        };

        let request = self
            .http
            .post(&self.config.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(
                reqwest::header::AUTHORIZATION,
                basic_credentials(client_id, client_secret),
            )
            .body("grant_type=client_credentials");

        let mut token = with_deadline(self.config.timeout, "Spotify token request", async {
            let response = request.send().await.map_err(AppError::from_transport)?;
            let response = ensure_success(response, "Spotify token endpoint")?;
            response
                .json::<AccessToken>()
                .await
                .map_err(AppError::from_transport)
        })
        .await?;
        token.obtained_at = current_timestamp_ms();

        self.cache
            .write()
            .await
            .set_as(TOKEN_CACHE_KEY, &token, token.expires_in.saturating_mul(1000));
        Ok(token)
    }

    // == Track Search ==
    async fn search(&self, name: &str, access_token: &str) -> Result<Option<String>> {
        let url = format!("{}/search", self.config.api_base_url.trim_end_matches('/'));
        let request = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("q", name), ("type", "track"), ("limit", "1"), ("offset", "0")]);

        let response = with_deadline(self.config.timeout, "Spotify search request", async {
            let response = request.send().await.map_err(AppError::from_transport)?;
            if response.status() == reqwest::StatusCode::UNAUTHORIZED {
                return Err(AppError::Authentication(
                    "Spotify API authentication failed".to_string(),
                ));
            }
            let response = ensure_success(response, "Spotify search")?;
            response
                .json::<SearchResponse>()
                .await
                .map_err(AppError::from_transport)
        })
        .await?;

        Ok(extract_track_url(response))
    }
}
