mod upstream;

use axum::{
    body::Body,
    debug_handler,
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use futures_util::TryStreamExt;
use tracing::error;

use crate::{AppError, AppResult, AppState};

pub use upstream::{Completion, CompletionError, SseDecoder};

pub const PROMPT: &str = "Create a list of three open-ended and engaging questions formatted as a single string. \
Each question should be separated by '||'. These questions are for an anonymous social messaging platform \
and should be suitable for a diverse audience. Avoid personal or sensitive topics, focusing instead on \
universal themes that encourage friendly interaction. For example, your output should be structured like this: \
'What's a hobby you've recently started?||If you could have dinner with any historical figure, who would it be?||\
What's a simple thing that makes you happy?'. Ensure the questions are intriguing, foster curiosity, and \
contribute to a positive and welcoming conversational environment.";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suggest-messages", post(suggest_messages))
}

/// Streams completion text straight through as `text/plain`.
#[debug_handler(state = AppState)]
pub(crate) async fn suggest_messages(State(completion): State<Completion>) -> AppResult<Response> {
    let deltas = match completion.stream(PROMPT).await {
        Ok(deltas) => deltas,
        Err(CompletionError::Upstream { status, body }) => {
            error!("completion service answered {status}: {body}");
            return Err(AppError::reject(status, "Error generating suggestions"));
        }
        Err(err) => {
            return Err(AppError::Internal {
                message: "Error generating suggestions",
                source: err.into(),
            });
        }
    };

    let body = Body::from_stream(
        deltas.inspect_err(|err| error!("suggestion stream broke off: {err}")),
    );

    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}
