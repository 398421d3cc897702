//! The visitor side of a public profile: a message form plus a panel of
//! suggested messages.
//!
//! [`Composer`] owns all of the page state and exposes one method per event
//! (typing, asking for suggestions, stream data arriving, picking a
//! suggestion, submitting). Suggestions follow a small state machine:
//!
//! ```text
//! Idle ──suggest──▶ Loading ──data──▶ Populated ──data──▶ Populated
//!   ▲                  │                  │
//!   └──────────────────┴──error──▶ Errored ◀┘
//! ```
//!
//! A new "suggest" discards the previous batch and error. Superseded
//! requests are not cancelled; whatever they still deliver is appended.

mod client;

use futures_util::StreamExt;

use crate::{
    messages::SendMessageRequest,
    schemas::{self, ValidationError},
    suggestions::{parse_batch, INITIAL_SUGGESTIONS},
};

pub use client::{ApiClient, ClientError, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestState {
    Idle,
    Loading,
    /// Data has arrived; `finished` once the stream has ended.
    Populated { finished: bool },
    Errored(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// A transient toast shown after submitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub variant: NoticeVariant,
    pub title: String,
    pub description: Option<String>,
}

/// What the suggestion panel should display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Panel<'a> {
    Error(&'a str),
    Suggestions(Vec<String>),
    Empty,
}

#[derive(Debug, Clone)]
pub struct Composer {
    username: String,
    content: String,
    completion: String,
    suggest: SuggestState,
    submitting: bool,
}

impl Composer {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            content: String::new(),
            completion: INITIAL_SUGGESTIONS.to_owned(),
            suggest: SuggestState::Idle,
            submitting: false,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn suggest_state(&self) -> &SuggestState {
        &self.suggest
    }

    /// True while a suggestion request is in flight.
    pub fn is_suggesting(&self) -> bool {
        matches!(self.suggest, SuggestState::Loading | SuggestState::Populated { finished: false })
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Whether the send button is enabled.
    pub fn can_send(&self) -> bool {
        !self.submitting && !self.content.is_empty()
    }

    pub fn begin_suggest(&mut self) {
        self.completion.clear();
        self.suggest = SuggestState::Loading;
    }

    /// Appends streamed text. The batch is rebuilt from the whole buffer.
    pub fn receive(&mut self, chunk: &str) {
        self.completion.push_str(chunk);
        self.suggest = SuggestState::Populated { finished: false };
    }

    pub fn finish_suggest(&mut self) {
        if matches!(self.suggest, SuggestState::Loading | SuggestState::Populated { .. }) {
            self.suggest = SuggestState::Populated { finished: true };
        }
    }

    pub fn fail_suggest(&mut self, message: impl Into<String>) {
        self.suggest = SuggestState::Errored(message.into());
    }

    /// The accumulated raw completion text.
    pub fn completion(&self) -> &str {
        &self.completion
    }

    /// The cleaned batch for the current buffer.
    pub fn suggestions(&self) -> Vec<String> {
        parse_batch(&self.completion)
    }

    pub fn panel(&self) -> Panel<'_> {
        match &self.suggest {
            SuggestState::Errored(message) => Panel::Error(message),
            _ if self.completion.is_empty() => Panel::Empty,
            _ => Panel::Suggestions(self.suggestions()),
        }
    }

    /// Copies the cleaned suggestion at `index` into the content field.
    pub fn select(&mut self, index: usize) -> Option<&str> {
        let suggestion = self.suggestions().into_iter().nth(index)?;
        self.content = suggestion;
        Some(&self.content)
    }

    /// Validates the form and builds the request to send, marking the
    /// composer as submitting.
    pub fn prepare_submit(&mut self) -> Result<SendMessageRequest, ValidationError> {
        schemas::validate_content(&self.content)?;
        self.submitting = true;
        Ok(SendMessageRequest {
            username: self.username.clone(),
            content: self.content.clone(),
        })
    }

    pub fn submit_succeeded(&mut self, message: impl Into<String>) -> Notice {
        self.submitting = false;
        self.content.clear();
        Notice {
            variant: NoticeVariant::Default,
            title: message.into(),
            description: None,
        }
    }

    pub fn submit_failed(&mut self, server_message: Option<&str>) -> Notice {
        self.submitting = false;
        Notice {
            variant: NoticeVariant::Destructive,
            title: "Error".to_owned(),
            description: Some(server_message.unwrap_or("Failed to send message").to_owned()),
        }
    }

    /// Sends the current content. Invalid content never reaches `transport`.
    pub async fn submit<T: Transport>(&mut self, transport: &T) -> Result<Notice, ValidationError> {
        let request = self.prepare_submit()?;
        Ok(match transport.send_message(&request).await {
            Ok(response) => self.submit_succeeded(response.message),
            Err(err) => self.submit_failed(err.server_message()),
        })
    }

    /// Runs one suggestion request to completion, calling `on_update` after
    /// every state change.
    pub async fn suggest<T, F>(&mut self, transport: &T, mut on_update: F)
    where
        T: Transport,
        F: FnMut(&Composer),
    {
        self.begin_suggest();
        on_update(self);

        let mut deltas = match transport.suggest_messages().await {
            Ok(deltas) => deltas,
            Err(err) => {
                self.fail_suggest(err.to_string());
                on_update(self);
                return;
            }
        };

        while let Some(delta) = deltas.next().await {
            match delta {
                Ok(text) => self.receive(&text),
                Err(err) => {
                    self.fail_suggest(err.to_string());
                    on_update(self);
                    return;
                }
            }
            on_update(self);
        }

        self.finish_suggest();
        on_update(self);
    }
}
