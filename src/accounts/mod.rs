mod check;
mod sign_up;
mod verify;

use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use rand::Rng;

use crate::{AppError, AppResult, AppState};

pub use check::{availability, Availability};

/// How long a verification code stays valid, in seconds.
pub const VERIFY_CODE_TTL: i64 = 60 * 60;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/check-username-unique", get(check::check_username_unique))
        .route("/sign-up", post(sign_up::sign_up))
        .route("/verify-code", post(verify::verify_code))
}

pub(crate) fn new_verify_code() -> String {
    rand::rng().random_range(100_000..1_000_000u32).to_string()
}

/// Unwraps a JSON body, answering malformed ones in the usual shape.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(body)| body)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}
