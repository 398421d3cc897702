#![allow(dead_code)]

use axum_test::TestServer;
use hushnote::{app, config::CompletionConfig, db, suggest::Completion, AppState};
use sqlx::SqlitePool;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub async fn state(completion: CompletionConfig) -> AppState {
    AppState {
        db_pool: db::in_memory().await.unwrap(),
        completion: Completion::new(completion),
    }
}

pub async fn test_server(completion: CompletionConfig) -> (TestServer, SqlitePool) {
    let state = state(completion).await;
    let db_pool = state.db_pool.clone();
    (TestServer::new(app(state)).unwrap(), db_pool)
}

pub fn completion_at(upstream: &MockServer) -> CompletionConfig {
    CompletionConfig {
        api_base: upstream.uri(),
        api_key: Some("test-key".to_owned()),
        model: "test-model".to_owned(),
    }
}

/// Server-sent events carrying `deltas`, the way chat completion APIs stream.
pub fn sse_body(deltas: &[&str]) -> String {
    let mut body = String::new();
    for delta in deltas {
        let chunk = serde_json::json!({ "choices": [{ "index": 0, "delta": { "content": delta } }] });
        body += &format!("data: {chunk}\n\n");
    }
    body += "data: [DONE]\n\n";
    body
}

/// A completion service that streams `deltas` for every request.
pub async fn completion_service(deltas: &[&str]) -> MockServer {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body(deltas), "text/event-stream"))
        .mount(&upstream)
        .await;
    upstream
}

pub async fn seed_account(db_pool: &SqlitePool, username: &str, verified: bool) {
    sqlx::query("INSERT INTO accounts (id,username,email,password_hash,verify_code,verify_code_expiry,is_verified,is_accepting_messages,created_at) VALUES (?,?,?,'x','123456',0,?,TRUE,0)")
        .bind(uuid::Uuid::now_v7().to_string())
        .bind(username)
        .bind(format!("{username}@example.com"))
        .bind(verified)
        .execute(db_pool)
        .await
        .unwrap();
}

pub async fn messages_for(db_pool: &SqlitePool, username: &str) -> Vec<String> {
    sqlx::query_scalar("SELECT m.content FROM messages m JOIN accounts a ON a.id = m.account_id WHERE a.username=? ORDER BY m.created_at, m.id")
        .bind(username)
        .fetch_all(db_pool)
        .await
        .unwrap()
}
