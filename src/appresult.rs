use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::error;

use crate::{schemas::ValidationError, ApiResponse};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// The caller gets `message` back as-is.
    Reject(StatusCode, String),
    /// Logged, then answered with `message` only.
    Internal {
        message: &'static str,
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn reject(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Reject(status, message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::reject(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::reject(StatusCode::NOT_FOUND, message)
    }

    pub fn invalid(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Reject(status, message) => {
                (status, Json(ApiResponse::fail(message))).into_response()
            }
            AppError::Internal { message, source } => {
                error!("{message}: {source:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::fail(message)),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal {
            message: "Internal server error",
            source: err.into(),
        }
    }
}

/// Swaps the generic 500 message for an endpoint specific one.
pub trait OrSay<T> {
    fn or_say(self, message: &'static str) -> AppResult<T>;
}

impl<T> OrSay<T> for AppResult<T> {
    fn or_say(self, message: &'static str) -> AppResult<T> {
        self.map_err(|err| match err {
            AppError::Internal { source, .. } => AppError::Internal { message, source },
            rejected => rejected,
        })
    }
}
