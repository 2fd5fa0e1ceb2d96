//! HTTP surface for the `meeple` board-game assistant.
//!
//! `meeple-web` wraps an [`Assistant`] in an axum server exposing the
//! recommendation, rule-question, rule-summary, and game-list tasks as JSON
//! endpoints. Every response uses the same envelope:
//!
//! ```json
//! {"status": "success", "data": {"recommendation": "..."}, "message": "..."}
//! ```
//!
//! Task failures are not HTTP errors: the user-facing failure text goes in
//! `data` in place of the answer and `status` stays `"success"`. Only the
//! extra `error_kind` field tells a failure apart.
//!
//! # Quick start
//!
//! ```ignore
//! use std::sync::Arc;
//! use meeple::prelude::*;
//! use meeple_web::{WebConfig, spawn_web};
//!
//! let assistant = Arc::new(AssistantConfig::default().build().await?);
//! let addr = spawn_web(assistant, WebConfig::default()).await?;
//! println!("Listening on http://{addr}");
//! ```

mod api;
mod server;

pub use api::ApiResponse;
pub use server::{build_router, start_server};

use std::net::SocketAddr;
use std::sync::Arc;

use meeple::Assistant;

/// Configuration for the web server.
pub struct WebConfig {
    /// Address to bind to. Default: `127.0.0.1:8888`.
    pub bind_addr: SocketAddr,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8888)),
        }
    }
}

/// Build the router, bind, and serve in a background task.
///
/// Returns the bound address, which differs from `config.bind_addr` when
/// binding to port 0.
pub async fn spawn_web(assistant: Arc<Assistant>, config: WebConfig) -> std::io::Result<SocketAddr> {
    let router = build_router(assistant);
    start_server(router, config.bind_addr).await
}
