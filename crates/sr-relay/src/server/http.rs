//! Plain HTTP endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use sr_core::lexer::{self, Token};
use sr_core::SessionConfig;
use sr_protocol::{ClassifyRequest, ConfigRequest, RelayStatus};

use crate::state::RelayState;

/// `POST /set-ssh-config`: replace the session config and reconnect
///
/// Answers as soon as the new connection attempt has started; the outcome
/// reaches clients as a session event.
pub(super) async fn set_ssh_config(
    State(state): State<Arc<RelayState>>,
    payload: Result<Json<ConfigRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected session config: {}", rejection.body_text());
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };

    let config = match SessionConfig::try_from(request) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Rejected session config: {}", e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    tracing::info!("Session config updated: {:?}", config);
    state.sessions.configure(config);
    StatusCode::OK.into_response()
}

/// `GET /status`: session and client snapshot
pub(super) async fn status(State(state): State<Arc<RelayState>>) -> Json<RelayStatus> {
    let status = state.sessions.status();
    Json(RelayStatus {
        state: status.state,
        generation: status.generation.as_u64(),
        configured: state.sessions.has_config(),
        clients: state.hub.len(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        error: status.error,
    })
}

/// `POST /classify`: tag a console input line
pub(super) async fn classify(
    State(state): State<Arc<RelayState>>,
    Json(request): Json<ClassifyRequest>,
) -> Json<Vec<Token>> {
    Json(lexer::classify(
        &request.input,
        request.is_error,
        &request.message,
        &state.aliases,
    ))
}
