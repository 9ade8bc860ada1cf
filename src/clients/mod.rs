//! Outbound Clients Module
//!
//! Everything that talks to another HTTP service lives here.
//!
//! # Clients
//! - `fetch`: configured external data sources, with deadline and backoff
//! - `countries`: REST Countries list with stale fallback
//! - `openai`: chat completions behind the [`ChatModel`] trait
//! - `spotify`: carol link lookup that degrades to `None`
//! - `ai_service`: configured AI services, including the local demo provider

pub mod ai_service;
pub mod auth;
pub mod countries;
pub mod fetch;
pub mod openai;
pub mod spotify;

pub use ai_service::{AiRequest, AiResult, AiServiceClient};
pub use auth::apply_authentication;
pub use countries::CountriesClient;
pub use fetch::{backoff_delay, join_url, with_deadline, ExternalFetcher, HttpMethod};
pub use openai::{ChatModel, OpenAiClient};
pub use spotify::SpotifyClient;
