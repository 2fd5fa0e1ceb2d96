//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use meeple::Assistant;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::api::{self, AppState};

/// Build the full axum router.
///
/// - `GET /`, `GET /health`, `GET /games`
/// - `POST /recommend`, `POST /explain-rules`, `POST /rule-summary`
pub fn build_router(assistant: Arc<Assistant>) -> Router {
    let state = AppState { assistant };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(api::get_root))
        .route("/health", get(api::get_health))
        .route("/games", get(api::get_games))
        .route("/recommend", post(api::post_recommend))
        .route("/explain-rules", post(api::post_explain_rules))
        .route("/rule-summary", post(api::post_rule_summary))
        .with_state(state)
        .layer(cors)
}

/// Bind `bind_addr`, serve `router` in a background task, and return the
/// bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;
    info!("HTTP server listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("HTTP server stopped: {e}");
        }
    });

    Ok(addr)
}
