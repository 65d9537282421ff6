//! Streaming client for an OpenAI-compatible chat-completions endpoint.
//!
//! Replies arrive as SSE chunks; content deltas are forwarded over a
//! channel as they arrive so the caller can display partial text, while the
//! full reply is only the concatenation of every delta. Classification of
//! the reply happens elsewhere, after the stream is exhausted.

use crate::{Result, TabchatError};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tabchat_types::ConversationTurn;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, trace};

/// An opaque caller-supplied API credential.
///
/// Held in memory only; the inner value is never logged, serialized or
/// persisted.
#[derive(Clone)]
pub struct ApiCredential(String);

impl ApiCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Access the raw value for the Authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiCredential(***)")
    }
}

/// Configuration for the completion client.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL of the endpoint, e.g. "https://api.openai.com/v1".
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Abort a stream that produces nothing for this long.
    pub idle_timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            idle_timeout: Duration::from_secs(120),
        }
    }
}

/// Events produced while consuming one streaming reply.
#[derive(Debug, Clone)]
pub enum CompletionEvent {
    /// A fragment of reply text, in arrival order.
    Delta(String),
    /// The stream completed normally.
    Done,
    /// The stream failed; no further events follow.
    Failed(String),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationTurn],
    stream: bool,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Deserialize, Default)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Client for the completion endpoint.
pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Submit a turn sequence and stream the reply.
    ///
    /// Returns once the request is accepted; events then arrive on the
    /// receiver until `Done` or `Failed`. A non-success status is reported
    /// as [`TabchatError::CompletionFailed`] before any event is produced.
    pub async fn stream_chat(
        &self,
        credential: &ApiCredential,
        turns: &[ConversationTurn],
    ) -> Result<mpsc::UnboundedReceiver<CompletionEvent>> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model: &self.config.model,
            messages: turns,
            stream: true,
        };

        debug!(
            target: "tabchat::completion",
            "Submitting {} turns to {} (model {})",
            turns.len(),
            url,
            self.config.model
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TabchatError::CompletionFailed(format!(
                "endpoint returned {}: {}",
                status,
                truncate_detail(&detail)
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let idle_timeout = self.config.idle_timeout;
        tokio::spawn(async move {
            consume_sse(response, tx, idle_timeout).await;
        });

        Ok(rx)
    }
}

/// Drain the SSE stream, forwarding deltas until `[DONE]` or failure.
async fn consume_sse(
    response: reqwest::Response,
    tx: mpsc::UnboundedSender<CompletionEvent>,
    idle_timeout: Duration,
) {
    let mut stream = response.bytes_stream().eventsource();

    loop {
        let event = match timeout(idle_timeout, stream.next()).await {
            Ok(Some(Ok(event))) => event,
            Ok(None) => {
                let msg = "stream closed before the reply completed".to_string();
                error!(target: "tabchat::completion", "{}", msg);
                let _ = tx.send(CompletionEvent::Failed(msg));
                return;
            }
            Ok(Some(Err(e))) => {
                let msg = format!("stream error: {}", e);
                error!(target: "tabchat::completion", "{}", msg);
                let _ = tx.send(CompletionEvent::Failed(msg));
                return;
            }
            Err(_) => {
                let msg = format!("stream idle for {}s, giving up", idle_timeout.as_secs());
                error!(target: "tabchat::completion", "{}", msg);
                let _ = tx.send(CompletionEvent::Failed(msg));
                return;
            }
        };

        let raw = event.data;
        trace!(target: "tabchat::completion", "SSE data: {:?}", raw);

        if raw == "[DONE]" {
            let _ = tx.send(CompletionEvent::Done);
            return;
        }

        let chunk: ChatChunk = match serde_json::from_str(&raw) {
            Ok(chunk) => chunk,
            Err(e) => {
                // Keepalives and vendor extensions come through the same
                // stream; skip what we can't read rather than aborting.
                debug!(target: "tabchat::completion", "Skipping unreadable chunk: {}", e);
                continue;
            }
        };

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                if !content.is_empty() && tx.send(CompletionEvent::Delta(content)).is_err() {
                    // Receiver dropped; stop consuming.
                    return;
                }
            }
        }
    }
}

fn truncate_detail(s: &str) -> String {
    const MAX_LEN: usize = 200;
    if s.len() <= MAX_LEN {
        s.to_string()
    } else {
        format!("{}...", &s[..MAX_LEN])
    }
}
