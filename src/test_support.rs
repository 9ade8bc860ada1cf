//! Shared helpers for unit tests: throwaway upstream servers and a scripted
//! chat model.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;

use crate::clients::ChatModel;
use crate::error::{AppError, Result};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Returns a base URL on which nothing is listening.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Chat model that replays canned replies in order and records prompts.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete_json(&self, _model: &str, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Internal("script exhausted".to_string())))
    }
}

pub const VALID_CULTURAL_JSON: &str = r#"{
  "dishes": {
    "entry": {"name": "Foie gras", "description": "Rich liver pâté.", "ingredients": ["duck liver", "salt"]},
    "main": {"name": "Dinde aux marrons", "description": "Turkey with chestnuts.", "ingredients": ["turkey", "chestnuts"]},
    "dessert": {"name": "Bûche de Noël", "description": "Yule log cake.", "ingredients": ["chocolate", "eggs"]}
  },
  "carol": {"name": "Il est né, le divin Enfant", "author": null}
}"#;
