use std::future::Future;

use futures_util::{stream::BoxStream, StreamExt};
use reqwest::{Response, StatusCode};
use thiserror::Error;

use crate::{messages::SendMessageRequest, ApiResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered, but not with a 2xx.
    #[error("{}", rejection_text(.status, .body))]
    Rejected {
        status: StatusCode,
        body: Option<ApiResponse>,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

fn rejection_text(status: &StatusCode, body: &Option<ApiResponse>) -> String {
    match body {
        Some(body) => body.message.clone(),
        None => format!("request failed with status {status}"),
    }
}

impl ClientError {
    /// The `message` the server put in its answer, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { body: Some(body), .. } => Some(&body.message),
            _ => None,
        }
    }
}

/// What the composer needs from the outside world.
pub trait Transport {
    fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> impl Future<Output = Result<ApiResponse, ClientError>>;

    fn suggest_messages(
        &self,
    ) -> impl Future<Output = Result<BoxStream<'static, Result<String, ClientError>>, ClientError>>;
}

/// Talks to a running server over HTTP.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `success` tells whether the handle is free; malformed handles are a
    /// [`ClientError::Rejected`] with status 400.
    pub async fn check_username(&self, username: &str) -> Result<ApiResponse, ClientError> {
        let response = self.http.get(self.url("/api/check-username-unique"))
            .query(&[("username", username)])
            .send()
            .await?;

        Ok(accepted(response).await?.json().await?)
    }
}

async fn accepted(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ApiResponse>().await.ok();
    Err(ClientError::Rejected { status, body })
}

impl Transport for ApiClient {
    async fn send_message(&self, request: &SendMessageRequest) -> Result<ApiResponse, ClientError> {
        let response = self.http.post(self.url("/api/send-message"))
            .json(request)
            .send()
            .await?;

        Ok(accepted(response).await?.json().await?)
    }

    async fn suggest_messages(&self) -> Result<BoxStream<'static, Result<String, ClientError>>, ClientError> {
        let response = self.http.post(self.url("/api/suggest-messages"))
            .json(&serde_json::json!({ "prompt": "" }))
            .send()
            .await?;
        let response = accepted(response).await?;

        let mut pending = Vec::new();
        Ok(response.bytes_stream()
            .map(move |chunk| -> Result<String, ClientError> {
                pending.extend_from_slice(&chunk?);
                Ok(take_utf8(&mut pending))
            })
            .boxed())
    }
}

/// Takes the longest valid UTF-8 prefix out of `pending`, leaving a
/// character cut off by a chunk boundary for the next round.
fn take_utf8(pending: &mut Vec<u8>) -> String {
    let valid = match std::str::from_utf8(pending) {
        Ok(text) => text.len(),
        Err(err) if err.error_len().is_none() => err.valid_up_to(),
        Err(_) => pending.len(),
    };

    let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
    pending.drain(..valid);
    text
}
