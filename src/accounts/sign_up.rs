use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::{db, schemas, ApiResponse, AppError, AppResult, OrSay};

use super::{json_body, new_verify_code, VERIFY_CODE_TTL};

#[derive(Deserialize)]
pub(crate) struct SignUpRequest {
    username: String,
    email: String,
    password: String,
}

async fn hash_password(password: String) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST)).await??;
    Ok(hash)
}

async fn register(db_pool: &SqlitePool, SignUpRequest { username, email, password }: SignUpRequest) -> AppResult<()> {
    schemas::validate_sign_up(&username, &email, &password).map_err(AppError::invalid)?;

    if db::find_verified(db_pool, &username).await?.is_some() {
        return Err(AppError::bad_request("Username is already taken"));
    }

    let verify_code = new_verify_code();
    let expiry = db::now() + VERIFY_CODE_TTL;

    let account = match db::find_by_email(db_pool, &email).await? {
        Some(account) if account.is_verified => {
            return Err(AppError::bad_request("User already exists with this email"));
        }
        account => account,
    };
    let password_hash = hash_password(password).await?;
    let id = match &account {
        Some(account) => account.id.clone(),
        None => Uuid::now_v7().to_string(),
    };

    let mut tx = db_pool.begin().await?;

    // an unverified claim on the same handle loses to the newer one
    sqlx::query("DELETE FROM accounts WHERE username=? AND is_verified=FALSE AND id<>?")
        .bind(&username)
        .bind(&id)
        .execute(&mut *tx)
        .await?;

    if account.is_some() {
        sqlx::query("UPDATE accounts SET username=?, password_hash=?, verify_code=?, verify_code_expiry=? WHERE id=?")
            .bind(&username)
            .bind(password_hash)
            .bind(&verify_code)
            .bind(expiry)
            .bind(&id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO accounts (id,username,email,password_hash,verify_code,verify_code_expiry,is_verified,is_accepting_messages,created_at) VALUES (?,?,?,?,?,?,FALSE,TRUE,?)")
            .bind(&id)
            .bind(&username)
            .bind(&email)
            .bind(password_hash)
            .bind(&verify_code)
            .bind(expiry)
            .bind(db::now())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(%username, %email, "verification code {verify_code} issued");
    Ok(())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn sign_up(
    State(db_pool): State<SqlitePool>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse>)> {
    register(&db_pool, json_body(body)?)
        .await
        .or_say("Error registering user")?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User registered successfully. Please verify your account.")),
    ))
}
