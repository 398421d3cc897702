use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::{db, schemas, ApiResponse, AppError, AppResult, OrSay};

use super::json_body;

#[derive(Deserialize)]
pub(crate) struct VerifyRequest {
    username: String,
    code: String,
}

async fn verify(db_pool: &SqlitePool, VerifyRequest { username, code }: VerifyRequest) -> AppResult<()> {
    schemas::validate_verify_code(&code).map_err(AppError::invalid)?;

    let Some(account) = db::find_by_username(db_pool, &username).await? else {
        return Err(AppError::not_found("User not found"));
    };

    if account.verify_code_expiry <= db::now() {
        return Err(AppError::bad_request(
            "Verification code has expired. Please sign up again to get a new code.",
        ));
    }
    if account.verify_code != code {
        return Err(AppError::bad_request("Incorrect verification code"));
    }

    sqlx::query("UPDATE accounts SET is_verified=TRUE WHERE id=?")
        .bind(&account.id)
        .execute(db_pool)
        .await?;

    info!(%username, "account verified");
    Ok(())
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn verify_code(
    State(db_pool): State<SqlitePool>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse>> {
    verify(&db_pool, json_body(body)?)
        .await
        .or_say("Error verifying user")?;

    Ok(Json(ApiResponse::ok("Account verified successfully")))
}
