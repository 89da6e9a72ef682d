//! HTTP implementation of the remote send operation.
//!
//! `POST {api_base}/chat/{room_id}` with body `{"message": "..."}`. The
//! backend answers with the reply as the response body, either plain text or
//! a JSON string.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use teaser_core::config::ServerConfig;
use teaser_core::sender::{ChatSender, RemoteFailure};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

// ─────────────────────────────────────────────
// HttpChatClient
// ─────────────────────────────────────────────

/// Talks to the brain-teaser backend over HTTP.
pub struct HttpChatClient {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"http://localhost:8123/api"`).
    api_base: String,
}

impl std::fmt::Debug for HttpChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChatClient")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl HttpChatClient {
    /// Build a client from the server section of the config.
    pub fn new(config: &ServerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpChatClient {
            client,
            api_base: config.api_base.clone(),
        })
    }

    /// Base URL requests are sent to.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Full URL for a room's chat endpoint.
    fn chat_url(&self, room_id: u32) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/{}", base, room_id)
    }
}

/// Extract the reply from a response body: a JSON string is unwrapped,
/// anything else is taken verbatim.
fn parse_reply(body: String) -> String {
    match serde_json::from_str::<String>(&body) {
        Ok(text) => text,
        Err(_) => body,
    }
}

#[async_trait]
impl ChatSender for HttpChatClient {
    async fn send_message(&self, room_id: u32, text: &str) -> Result<String, RemoteFailure> {
        let url = self.chat_url(room_id);
        debug!(room_id, url = %url, chars = text.chars().count(), "Sending chat message");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message: text })
            .send()
            .await
            .map_err(|e| {
                error!(room_id, error = %e, "HTTP request failed");
                RemoteFailure::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(room_id, status = %status, body = %body, "Backend error");
            return Err(RemoteFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            error!(room_id, error = %e, "Failed to read reply body");
            RemoteFailure::Transport(e.to_string())
        })?;

        let reply = parse_reply(body);
        if reply.trim().is_empty() {
            return Err(RemoteFailure::EmptyReply);
        }

        debug!(room_id, chars = reply.chars().count(), "Reply received");
        Ok(reply)
    }

    fn display_name(&self) -> &str {
        "http"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
