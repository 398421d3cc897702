use axum::{
    debug_handler,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{db, schemas, ApiResponse, AppError, AppResult, OrSay};

#[derive(Deserialize)]
pub(crate) struct UsernameQuery {
    username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Taken,
    Available,
}

/// Malformed handles come back as a 400 rejection, everything else as
/// whether a verified account holds the handle.
pub async fn availability(db_pool: &SqlitePool, username: Option<&str>) -> AppResult<Availability> {
    schemas::validate_username(username).map_err(AppError::invalid)?;
    let username = username.unwrap_or_default();

    Ok(match db::find_verified(db_pool, username).await? {
        Some(_) => Availability::Taken,
        None => Availability::Available,
    })
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn check_username_unique(
    query: Result<Query<UsernameQuery>, QueryRejection>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<Json<ApiResponse>> {
    let Query(UsernameQuery { username }) =
        query.map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
    let availability = availability(&db_pool, username.as_deref())
        .await
        .or_say("Error checking username")?;

    Ok(Json(match availability {
        Availability::Taken => ApiResponse::fail("Username is already taken"),
        Availability::Available => ApiResponse::ok("Username is unique"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn insert(db_pool: &SqlitePool, username: &str, email: &str, verified: bool) {
        sqlx::query("INSERT INTO accounts (id,username,email,password_hash,verify_code,verify_code_expiry,is_verified,created_at) VALUES (?,?,?,'x','123456',0,?,0)")
            .bind(uuid::Uuid::now_v7().to_string())
            .bind(username)
            .bind(email)
            .bind(verified)
            .execute(db_pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn only_verified_accounts_take_a_handle() {
        let db_pool = db::in_memory().await.unwrap();

        assert_eq!(availability(&db_pool, Some("alice")).await.unwrap(), Availability::Available);

        insert(&db_pool, "alice", "alice@example.com", false).await;
        assert_eq!(availability(&db_pool, Some("alice")).await.unwrap(), Availability::Available);

        insert(&db_pool, "alice", "alice2@example.com", true).await;
        assert_eq!(availability(&db_pool, Some("alice")).await.unwrap(), Availability::Taken);
        assert_eq!(availability(&db_pool, Some("Alice")).await.unwrap(), Availability::Available);
    }

    #[tokio::test]
    async fn malformed_handles_are_rejected() {
        let db_pool = db::in_memory().await.unwrap();

        for username in [None, Some(""), Some("a"), Some("no spaces"), Some("way_too_long_for_a_handle")] {
            match availability(&db_pool, username).await {
                Err(AppError::Reject(status, message)) => {
                    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
                    assert!(!message.is_empty());
                }
                other => panic!("{username:?} should be rejected, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn repeated_checks_agree() {
        let db_pool = db::in_memory().await.unwrap();
        for _ in 0..3 {
            assert_eq!(availability(&db_pool, Some("bob")).await.unwrap(), Availability::Available);
        }
    }
}
