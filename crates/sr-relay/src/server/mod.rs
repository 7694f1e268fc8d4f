//! HTTP and WebSocket transport
//!
//! | Route                  | Purpose                                   |
//! |------------------------|-------------------------------------------|
//! | `POST /set-ssh-config` | replace the session config and reconnect  |
//! | `GET /ws`              | duplex command/output channel             |
//! | `GET /status`          | session and client snapshot               |
//! | `POST /classify`       | lexical tagging of a console input line   |

mod cors;
mod http;
mod ws;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::state::RelayState;

/// Build the router over the shared relay state
pub fn router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/set-ssh-config", post(http::set_ssh_config))
        .route("/status", get(http::status))
        .route("/classify", post(http::classify))
        .route("/ws", get(ws::ws_upgrade))
        .layer(cors::cors_layer(&state.config))
        .with_state(state)
}

/// HTTP/WebSocket server for browser clients
pub struct RelayServer {
    state: Arc<RelayState>,
    cancel: CancellationToken,
}

impl RelayServer {
    /// Create a new server
    pub fn new(state: Arc<RelayState>, cancel: CancellationToken) -> Self {
        Self { state, cancel }
    }

    /// Serve on `address` until the cancellation token fires
    pub async fn run(&self, address: &str) -> Result<()> {
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind relay server to {}", address))?;

        tracing::info!("Relay server listening on {}", address);

        axum::serve(listener, router(Arc::clone(&self.state)))
            .with_graceful_shutdown(self.cancel.clone().cancelled_owned())
            .await
            .context("Relay server failed")?;

        Ok(())
    }
}
