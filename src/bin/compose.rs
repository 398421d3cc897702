//! Leave an anonymous message from the terminal.

use std::io::Write;

use clap::{Parser, Subcommand};
use hushnote::composer::{ApiClient, Composer, NoticeVariant, Panel};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Base URL of the hushnote server
    #[arg(long, env = "HUSHNOTE_URL", default_value = "http://localhost:8080")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a username can still be claimed
    Check { username: String },

    /// Stream fresh message suggestions
    Suggest { username: String },

    /// Send an anonymous message
    Send {
        username: String,

        /// Send the n-th fresh suggestion (counting from 1) instead of typed text
        #[arg(long, conflicts_with = "content")]
        pick: Option<usize>,

        content: Vec<String>,
    },
}

fn print_panel(composer: &Composer) {
    match composer.panel() {
        Panel::Error(message) => println!("error: {message}"),
        Panel::Empty => println!("No messages yet."),
        Panel::Suggestions(suggestions) => {
            for (i, suggestion) in suggestions.iter().enumerate() {
                println!("{:>2}. {suggestion}", i + 1);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(cli.server);

    match cli.command {
        Command::Check { username } => match client.check_username(&username).await {
            Ok(response) => println!("{}", response.message),
            Err(err) => anyhow::bail!("{err}"),
        },
        Command::Suggest { username } => {
            let mut composer = Composer::new(username);
            let mut shown = 0;
            composer.suggest(&client, |composer| {
                // stream the raw text as it comes, then list the batch
                let raw = composer.completion();
                if raw.len() > shown {
                    eprint!("{}", &raw[shown..]);
                    let _ = std::io::stderr().flush();
                    shown = raw.len();
                }
            }).await;
            eprintln!();
            print_panel(&composer);
        }
        Command::Send { username, pick, content } => {
            let mut composer = Composer::new(username);
            match pick {
                Some(n) => {
                    composer.suggest(&client, |_| {}).await;
                    if composer.select(n.saturating_sub(1)).is_none() {
                        print_panel(&composer);
                        anyhow::bail!("there is no suggestion #{n}");
                    }
                }
                None => composer.set_content(content.join(" ")),
            }

            let notice = composer.submit(&client).await?;
            match notice.variant {
                NoticeVariant::Default => println!("{}", notice.title),
                NoticeVariant::Destructive => anyhow::bail!(
                    "{}: {}",
                    notice.title,
                    notice.description.unwrap_or_default()
                ),
            }
        }
    }

    Ok(())
}
