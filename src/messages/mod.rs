mod page;
mod send;

use axum::{routing::{get, post}, Router};

use crate::AppState;

pub use send::{deliver, SendMessageRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/send-message", post(send::send_message))
}

/// Public profile pages, mounted under `/u`.
pub fn page_router() -> Router<AppState> {
    Router::new()
        .route("/{username}", get(page::profile).post(page::profile_send))
        .route("/{username}/suggest", post(page::profile_suggest))
}
