//! Streaming chat completions from an OpenAI compatible API.
//!
//! The service answers with server-sent events; every `data:` line carries a
//! JSON chunk whose `choices[0].delta.content` is the next bit of text, and the
//! stream ends with `data: [DONE]`.

use axum::http::StatusCode;
use futures_util::{stream::{self, BoxStream}, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::CompletionConfig;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion service is not configured")]
    NotConfigured,

    #[error("completion service answered {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Clone)]
pub struct Completion {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl Completion {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Starts a completion for `prompt` and yields the text as it arrives.
    pub async fn stream(
        &self,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<String, CompletionError>>, CompletionError> {
        let Some(api_key) = &self.config.api_key else {
            return Err(CompletionError::NotConfigured);
        };

        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let response = self.http.post(&url)
            .bearer_auth(api_key)
            .json(&ChatRequest {
                model: &self.config.model,
                messages: [ChatMessage { role: "user", content: prompt }],
                stream: true,
                max_tokens: 400,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Upstream { status, body });
        }
        debug!(%url, "completion stream opened");

        let mut decoder = SseDecoder::default();
        let deltas = response.bytes_stream()
            .map(move |chunk| -> Result<Vec<Result<String, CompletionError>>, CompletionError> {
                let events = decoder.feed(&chunk?);
                Ok(events.iter().filter_map(|data| delta_text(data)).map(Ok).collect())
            })
            .map_ok(stream::iter)
            .try_flatten()
            .boxed();

        Ok(deltas)
    }
}

/// The text carried by one `data:` payload, if any.
fn delta_text(data: &str) -> Option<String> {
    if data == "[DONE]" {
        return None;
    }
    let chunk: ChatChunk = serde_json::from_str(data).ok()?;
    chunk.choices.into_iter().next()?.delta.content.filter(|text| !text.is_empty())
}

/// Incremental server-sent event reader: feed it bytes, get back the `data:`
/// payloads of every line completed so far.
#[derive(Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut data = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(payload) = line.strip_prefix("data:") {
                data.push(payload.strip_prefix(' ').unwrap_or(payload).to_owned());
            }
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_lines_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.feed(b"data: {\"a\"").is_empty());
        assert_eq!(decoder.feed(b":1}\r\n\r\ndata: [DONE]\n\n"), vec!["{\"a\":1}", "[DONE]"]);
    }

    #[test]
    fn ignores_other_fields() {
        let mut decoder = SseDecoder::default();
        assert_eq!(decoder.feed(b": keep-alive\nevent: message\nid: 3\ndata:x\n"), vec!["x"]);
    }

    #[test]
    fn multibyte_text_survives_chunking() {
        let mut decoder = SseDecoder::default();
        let line = "data: héllo\n".as_bytes();
        assert!(decoder.feed(&line[..8]).is_empty());
        assert_eq!(decoder.feed(&line[8..]), vec!["héllo"]);
    }

    #[test]
    fn extracts_delta_text() {
        assert_eq!(
            delta_text(r#"{"choices":[{"delta":{"content":"Hi||"}}]}"#).as_deref(),
            Some("Hi||")
        );
        assert_eq!(delta_text(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#), None);
        assert_eq!(delta_text(r#"{"choices":[]}"#), None);
        assert_eq!(delta_text("[DONE]"), None);
        assert_eq!(delta_text("not json"), None);
    }

    #[tokio::test]
    async fn refuses_without_api_key() {
        let completion = Completion::new(CompletionConfig::default());
        assert!(matches!(completion.stream("hi").await, Err(CompletionError::NotConfigured)));
    }
}
