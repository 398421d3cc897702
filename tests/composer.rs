//! The composer driven against a live server over HTTP.

mod common;

use hushnote::{
    app,
    composer::{ApiClient, Composer, NoticeVariant, Panel, SuggestState},
    AppState,
};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;

use common::{completion_at, completion_service, messages_for, seed_account, state};

async fn serve(state: AppState) -> ApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    ApiClient::new(format!("http://{address}"))
}

#[tokio::test]
async fn visitor_picks_a_suggestion_and_sends_it() {
    let upstream = completion_service(&["What's your favorite movie?", "||Do you have any pets?"]).await;
    let state = state(completion_at(&upstream)).await;
    let db_pool = state.db_pool.clone();
    seed_account(&db_pool, "alice", true).await;
    let client = serve(state).await;

    let mut composer = Composer::new("alice");
    composer.set_content("something I typed");
    composer.suggest(&client, |_| {}).await;

    assert_eq!(composer.suggest_state(), &SuggestState::Populated { finished: true });
    assert_eq!(
        composer.panel(),
        Panel::Suggestions(vec![
            "What's your favorite movie?".to_owned(),
            "Do you have any pets?".to_owned(),
        ])
    );

    composer.select(0);
    assert_eq!(composer.content(), "What's your favorite movie?");

    let notice = composer.submit(&client).await.unwrap();
    assert_eq!(notice.variant, NoticeVariant::Default);
    assert_eq!(notice.title, "Message sent successfully");
    assert_eq!(composer.content(), "");
    assert_eq!(messages_for(&db_pool, "alice").await, vec!["What's your favorite movie?"]);
}

#[tokio::test]
async fn server_refusals_become_error_notices() {
    let state = state(Default::default()).await;
    let client = serve(state).await;

    let mut composer = Composer::new("nobody");
    composer.set_content("Hello out there!");
    let notice = composer.submit(&client).await.unwrap();

    assert_eq!(notice.variant, NoticeVariant::Destructive);
    assert_eq!(notice.description.as_deref(), Some("User not found"));
    assert_eq!(composer.content(), "Hello out there!");

    composer.suggest(&client, |_| {}).await;
    assert_eq!(composer.panel(), Panel::Error("Error generating suggestions"));
}

#[tokio::test]
async fn availability_from_the_client() {
    let state = state(Default::default()).await;
    seed_account(&state.db_pool, "carol", true).await;
    let client = serve(state).await;

    assert!(client.check_username("dave").await.unwrap().success);
    assert!(!client.check_username("carol").await.unwrap().success);

    let err = client.check_username("no way").await.unwrap_err();
    assert_eq!(err.server_message(), Some("Username must not contain special characters"));
}
