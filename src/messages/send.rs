use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::{accounts::json_body, db, schemas, ApiResponse, AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub username: String,
    pub content: String,
}

/// Stores an anonymous message for `username`.
pub async fn deliver(db_pool: &SqlitePool, username: &str, content: &str) -> AppResult<()> {
    schemas::validate_content(content).map_err(AppError::invalid)?;

    let Some(account) = db::find_by_username(db_pool, username).await? else {
        return Err(AppError::not_found("User not found"));
    };
    if !account.is_accepting_messages {
        return Err(AppError::reject(StatusCode::FORBIDDEN, "User is not accepting messages"));
    }

    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO messages (id,account_id,content,created_at) VALUES (?,?,?,?)")
        .bind(id.to_string())
        .bind(&account.id)
        .bind(content)
        .bind(db::now())
        .execute(db_pool)
        .await?;

    debug!(%username, %id, "message stored");
    Ok(())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn send_message(
    State(db_pool): State<SqlitePool>,
    body: Result<Json<SendMessageRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    let SendMessageRequest { username, content } = json_body(body)?;
    deliver(&db_pool, &username, &content).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok("Message sent successfully"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed(db_pool: &SqlitePool, accepting: bool) {
        sqlx::query("INSERT INTO accounts (id,username,email,password_hash,verify_code,verify_code_expiry,is_verified,is_accepting_messages,created_at) VALUES ('a','alice','alice@example.com','x','123456',0,TRUE,?,0)")
            .bind(accepting)
            .execute(db_pool)
            .await
            .unwrap();
    }

    async fn stored(db_pool: &SqlitePool) -> Vec<db::Message> {
        sqlx::query_as("SELECT * FROM messages ORDER BY created_at")
            .fetch_all(db_pool)
            .await
            .unwrap()
    }

    fn status(result: AppResult<()>) -> StatusCode {
        match result {
            Err(AppError::Reject(status, _)) => status,
            other => panic!("expected a rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stores_messages_for_the_recipient() {
        let db_pool = db::in_memory().await.unwrap();
        seed(&db_pool, true).await;

        deliver(&db_pool, "alice", "Do you have any pets?").await.unwrap();

        let messages = stored(&db_pool).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].account_id, "a");
        assert_eq!(messages[0].content, "Do you have any pets?");
    }

    #[tokio::test]
    async fn refusals() {
        let db_pool = db::in_memory().await.unwrap();
        assert_eq!(status(deliver(&db_pool, "alice", "Hello there, friend").await), StatusCode::NOT_FOUND);

        seed(&db_pool, false).await;
        assert_eq!(status(deliver(&db_pool, "alice", "Hello there, friend").await), StatusCode::FORBIDDEN);
        assert_eq!(status(deliver(&db_pool, "alice", "").await), StatusCode::BAD_REQUEST);
        assert!(stored(&db_pool).await.is_empty());
    }
}
