//! Relay controller
//!
//! Turns one command request into exactly one output event. Requests are
//! checked against the session before anything reaches the remote host:
//! without a configuration the client gets "not configured", and while the
//! session is not ready it gets "not connected".

use std::sync::Arc;

use sr_core::{CommandRequest, ExecutionResult};
use sr_protocol::ServerMessage;

use crate::executor::CommandExecutor;
use crate::session::SessionManager;

/// Validates readiness and delegates commands to the executor
pub struct RelayController {
    sessions: Arc<SessionManager>,
    executor: CommandExecutor,
}

impl RelayController {
    /// Create a new relay controller
    pub fn new(sessions: Arc<SessionManager>, executor: CommandExecutor) -> Self {
        Self { sessions, executor }
    }

    /// Run one command and build the event for the client that issued it
    pub async fn handle_command(&self, request: &CommandRequest) -> ServerMessage {
        let lease = match self.sessions.lease() {
            Ok(lease) => lease,
            Err(e) => {
                tracing::debug!("Rejecting '{}': {}", request.command_name, e);
                return ServerMessage::error(e.to_string());
            }
        };

        let command_line = request.command_line();
        tracing::info!("Executing '{}' ({})", command_line, lease.generation);

        match self.executor.execute(&lease, &command_line).await {
            Ok(result) => self.output_event(&result),
            Err(e) => {
                tracing::warn!("Command '{}' failed: {}", command_line, e);
                ServerMessage::error(e.to_string())
            }
        }
    }

    /// Output event for a finished execution
    ///
    /// A result from a connection that has since been replaced is still
    /// delivered, tagged as stale with the generation it ran under.
    fn output_event(&self, result: &ExecutionResult) -> ServerMessage {
        let stale = !self.sessions.is_current(result.generation());
        if stale {
            tracing::warn!(
                "Result from {} arrived after the session was reconfigured",
                result.generation()
            );
        }

        ServerMessage::Output {
            message: result.message().to_string(),
            is_error: !result.succeeded(),
            generation: stale.then(|| result.generation().as_u64()),
            stale,
        }
    }
}
