//! Board-game assistant HTTP server.
//!
//! # Usage
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run -p meeple-web
//! OPENAI_API_KEY=sk-... cargo run -p meeple-web -- --port 9000 --data-dir /srv/meeple/data
//! MEEPLE_BACKEND=local cargo run -p meeple-web
//! ```
//!
//! ```bash
//! curl -s localhost:8888/recommend -H 'content-type: application/json' \
//!   -d '{"query": "두 명이 할 전략 게임 추천해줘", "session_id": "demo"}'
//! ```

use std::net::IpAddr;
use std::sync::Arc;

use clap::Parser;
use meeple::prelude::*;
use meeple_web::{WebConfig, spawn_web};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Board-game recommendation and rule-explanation server.
#[derive(Parser)]
#[command(about = "HTTP server for the meeple board-game assistant")]
struct Args {
    /// Address to bind.
    #[arg(long, env = "MEEPLE_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "MEEPLE_PORT", default_value_t = 8888)]
    port: u16,

    #[command(flatten)]
    assistant: AssistantArgs,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // 1. Load data and construct backends.
    let config = AssistantConfig::from(args.assistant);
    let assistant = Arc::new(config.build().await?);

    // 2. Serve until interrupted.
    let web_config = WebConfig {
        bind_addr: (args.host, args.port).into(),
    };
    let addr = spawn_web(assistant, web_config)
        .await
        .map_err(|e| format!("failed to bind: {e}"))?;
    println!("Listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to wait for shutdown signal: {e}"))?;
    println!("Shutting down.");
    Ok(())
}
