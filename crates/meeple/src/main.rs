//! Ask the board-game assistant from the command line.
//!
//! # Examples
//!
//! ```sh
//! # Recommend games (a count in the query overrides --top-k)
//! OPENAI_API_KEY=sk-... meeple recommend "친구들과 할 가벼운 게임 5개 추천해줘"
//!
//! # Ask a rule question about one game
//! meeple ask 뱅 "보안관은 정체를 공개하나요?"
//!
//! # Summarize a game's rules with the local fine-tuned model
//! MEEPLE_BACKEND=local meeple summarize 카탄
//!
//! # List known games
//! meeple --data-dir /srv/meeple/data games
//! ```

use std::process;

use clap::{Parser, Subcommand};
use meeple::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Grounded board-game recommendations, rule answers, and rule summaries.
#[derive(Parser)]
#[command(name = "meeple", version)]
struct Cli {
    #[command(flatten)]
    assistant: AssistantArgs,

    /// Conversation session id
    #[arg(long, default_value = DEFAULT_SESSION_ID, global = true)]
    session: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recommend games matching a free-text request
    Recommend {
        query: String,
        /// Number of games when the query names no count
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
    },
    /// Answer a question about one game's rules
    Ask { game: String, question: String },
    /// Summarize one game's full rules
    Summarize { game: String },
    /// List known games
    Games,
}

async fn run(cli: Cli) -> Result<(), String> {
    let assistant = AssistantConfig::from(cli.assistant).build().await?;
    let output = match &cli.command {
        Command::Recommend { query, top_k } => {
            render_reply(assistant.recommend(query, *top_k, &cli.session).await)
        }
        Command::Ask { game, question } => render_reply(
            assistant
                .answer_rule_question(game, question, &cli.session)
                .await,
        ),
        Command::Summarize { game } => {
            render_reply(assistant.summarize_rules(game, &cli.session).await)
        }
        Command::Games => assistant.list_entities().join("\n"),
    };
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
