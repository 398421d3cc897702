pub mod accounts;
pub mod appresult;
pub mod composer;
pub mod config;
pub mod db;
pub mod messages;
pub mod res;
pub mod schemas;
pub mod suggest;
pub mod suggestions;

use std::time::Duration;

use axum::{
    debug_handler,
    extract::FromRef,
    http::{header::CONTENT_TYPE, Method},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;

pub use appresult::{AppError, AppResult, OrSay};
use res::Markdown;
use suggest::Completion;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub completion: Completion,
}

/// The body of every JSON answer the API gives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .merge(accounts::router())
        .merge(messages::router())
        .merge(suggest::router());

    Router::new()
        .route("/", get(index))
        .nest("/api", api)
        .nest("/u", messages::page_router())
        .layer(cors)
        .with_state(state)
}

#[debug_handler]
async fn index() -> impl IntoResponse {
    Markdown(include_res!(str, "/pages/hello.md"))
}
