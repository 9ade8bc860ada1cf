//! Countries list: fetched from REST Countries, cached, and used to validate
//! country names before any model call.

use std::time::Duration;

use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{info, warn};

use crate::cache::SharedCache;
use crate::clients::fetch::{ensure_success, with_deadline};
use crate::error::{AppError, Result};

// == Constants ==
pub const COUNTRIES_CACHE_KEY: &str = "countries";
const COUNTRIES_TTL_MS: u64 = 10 * 60 * 1000;

// == Wire Types ==
#[derive(Debug, Deserialize)]
struct RestCountry {
    name: RestCountryName,
}

#[derive(Debug, Deserialize)]
struct RestCountryName {
    #[serde(default)]
    common: String,
}

/// Keeps non-blank common names, sorted.
fn extract_names(raw: Vec<RestCountry>) -> Vec<String> {
    let mut names: Vec<String> = raw
        .into_iter()
        .map(|c| c.name.common)
        .filter(|name| !name.trim().is_empty())
        .collect();
    names.sort();
    names
}

// == Countries Client ==
#[derive(Debug, Clone)]
pub struct CountriesClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    cache: SharedCache,
}

impl CountriesClient {
    pub fn new(http: reqwest::Client, url: String, timeout: Duration, cache: SharedCache) -> Self {
        Self {
            http,
            url,
            timeout,
            cache,
        }
    }

    // == List ==
    /// Sorted list of country names.
    ///
    /// Served from the cache while fresh. When the refresh fails, an expired
    /// list is served instead of an error.
    pub async fn list(&self) -> Result<Vec<String>> {
        // The stale copy is captured before `get_as` evicts it.
        let stale = {
            let mut cache = self.cache.write().await;
            let stale = cache.lookup_as::<Vec<String>>(COUNTRIES_CACHE_KEY).any();
            if let Some(countries) = cache.get_as::<Vec<String>>(COUNTRIES_CACHE_KEY) {
                return Ok(countries);
            }
            stale
        };

        match self.fetch().await {
            Ok(countries) => {
                info!(count = countries.len(), "countries list refreshed");
                self.cache
                    .write()
                    .await
                    .set_as(COUNTRIES_CACHE_KEY, &countries, COUNTRIES_TTL_MS);
                Ok(countries)
            }
            Err(err) => {
                if let Some(countries) = stale {
                    warn!(error = %err, "countries refresh failed, serving stale list");
                    return Ok(countries);
                }

                warn!(error = %err, "countries refresh failed with nothing cached");
                Err(match err {
                    AppError::Timeout(_) => {
                        AppError::Timeout("Request timed out. Please try again.".to_string())
                    }
                    _ => AppError::ServiceUnavailable(
                        "Unable to load countries. Please try again later.".to_string(),
                    ),
                })
            }
        }
    }

    // == Validate ==
    /// Checks `name` against the list, ignoring case.
    ///
    /// Returns the name as spelled in the list.
    pub async fn validate(&self, name: &str) -> Result<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("Country name is required".to_string()));
        }

        let wanted = trimmed.to_lowercase();
        let countries = self.list().await?;
        countries
            .into_iter()
            .find(|c| c.to_lowercase() == wanted)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Country '{}' is not recognized. Please select a valid country from the list.",
                    trimmed
                ))
            })
    }

    async fn fetch(&self) -> Result<Vec<String>> {
        let request = self.http.get(&self.url).header(ACCEPT, "application/json");
        let raw = with_deadline(self.timeout, "REST Countries request", async {
            let response = request.send().await.map_err(AppError::from_transport)?;
            let response = ensure_success(response, "REST Countries API")?;
            response
                .json::<Vec<RestCountry>>()
                .await
                .map_err(AppError::from_transport)
        })
        .await?;
        Ok(extract_names(raw))
    }
}
