use axum::{
    debug_handler,
    extract::{Path, Query, State},
    response::Html,
    Form,
};
use futures_util::StreamExt;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::error;

use crate::{
    composer::{Composer, Panel},
    include_res,
    res::{encode_query, escape},
    suggest::{Completion, PROMPT},
    AppError,
};

use super::deliver;

#[derive(Deserialize)]
pub(crate) struct ProfileQuery {
    content: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ProfileForm {
    #[serde(default)]
    content: String,
}

struct Notice<'a> {
    variant: &'a str,
    title: &'a str,
    description: &'a str,
}

fn render_panel(username: &str, panel: Panel<'_>) -> String {
    match panel {
        Panel::Error(message) => include_res!(str, "/pages/suggest_note.html")
            .replace("{message}", &escape(message)),
        Panel::Empty => include_res!(str, "/pages/suggest_note.html")
            .replace("{message}", "No messages yet."),
        Panel::Suggestions(suggestions) => {
            let mut items = String::new();
            for suggestion in suggestions {
                let href = format!("/u/{}?content={}", encode_query(username), encode_query(&suggestion));
                items += &include_res!(str, "/pages/suggestion_item.html")
                    .replace("{href}", &escape(&href))
                    .replace("{label}", &escape(&suggestion));
            }
            items
        }
    }
}

/// Fills the templates. Visitor text goes in last and escaped, so it never
/// expands a placeholder.
fn render(composer: &Composer, notice: Option<Notice>) -> Html<String> {
    let username = composer.username();

    let notice = match notice {
        Some(Notice { variant, title, description }) => include_res!(str, "/pages/notice.html")
            .replace("{variant}", variant)
            .replace("{title}", &escape(title))
            .replace("{description}", &escape(description)),
        None => String::new(),
    };

    let body = include_res!(str, "/pages/send_message.html")
        .replace("{action}", &escape(&format!("/u/{}", encode_query(username))))
        .replace("{suggest_action}", &escape(&format!("/u/{}/suggest", encode_query(username))))
        .replace("{notice}", &notice)
        .replace("{suggestions}", &render_panel(username, composer.panel()))
        .replace("{username}", &escape(username))
        .replace("{content}", &escape(composer.content()));

    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &format!("Send a message to @{}", escape(username)))
            .replace("{body}", &body)
    )
}

fn composer_for(username: &str, content: &str) -> Composer {
    let mut composer = Composer::new(username);
    composer.set_content(content);
    composer
}

#[debug_handler]
pub(crate) async fn profile(
    Path(username): Path<String>,
    Query(ProfileQuery { content }): Query<ProfileQuery>,
) -> Html<String> {
    render(&composer_for(&username, content.as_deref().unwrap_or_default()), None)
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile_send(
    Path(username): Path<String>,
    State(db_pool): State<SqlitePool>,
    Form(ProfileForm { content }): Form<ProfileForm>,
) -> Html<String> {
    let mut composer = composer_for(&username, &content);
    match deliver(&db_pool, &username, &content).await {
        Ok(()) => {
            composer.set_content("");
            render(&composer, Some(Notice {
                variant: "default",
                title: "Message sent successfully",
                description: "",
            }))
        }
        Err(AppError::Reject(_, message)) => render(&composer, Some(Notice {
            variant: "destructive",
            title: "Error",
            description: &message,
        })),
        Err(AppError::Internal { source, .. }) => {
            error!("sending to @{username} failed: {source:#}");
            render(&composer, Some(Notice {
                variant: "destructive",
                title: "Error",
                description: "Failed to send message",
            }))
        }
    }
}

/// Replaces the batch with fresh suggestions from the completion service,
/// keeping whatever the visitor has typed so far.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn profile_suggest(
    Path(username): Path<String>,
    State(completion): State<Completion>,
    Form(ProfileForm { content }): Form<ProfileForm>,
) -> Html<String> {
    let mut composer = composer_for(&username, &content);
    composer.begin_suggest();

    match completion.stream(PROMPT).await {
        Ok(mut deltas) => {
            while let Some(delta) = deltas.next().await {
                match delta {
                    Ok(text) => composer.receive(&text),
                    Err(err) => {
                        error!("suggestion stream broke off: {err}");
                        composer.fail_suggest("Error generating suggestions");
                        break;
                    }
                }
            }
            composer.finish_suggest();
        }
        Err(err) => {
            error!("suggestions for @{username} failed: {err}");
            composer.fail_suggest("Error generating suggestions");
        }
    }

    render(&composer, None)
}
