//! WebSocket messages for the shell-relay transport channel
//!
//! Every frame is a JSON text message with a `type` field.
//!
//! # Client → Server
//!
//! | Type      | Fields                                  |
//! |-----------|-----------------------------------------|
//! | `command` | `command`, `args` (ordered, may be empty) |
//!
//! `commandName` and `arguments` are accepted as aliases.
//!
//! # Server → Client
//!
//! | Type      | Fields                                             |
//! |-----------|----------------------------------------------------|
//! | `output`  | `message`, `isError`, `generation?`, `stale?`      |
//! | `session` | `state`, `generation`, `error?`                    |
//!
//! Clients must branch on `isError`, never on message text.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::session::SessionState;

/// Message sent by a browser client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Run a command on the remote host
    Command {
        #[serde(alias = "commandName")]
        command: String,
        #[serde(default, alias = "arguments")]
        args: Vec<String>,
    },
}

impl ClientMessage {
    /// Decode a client text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Message pushed by the relay to a browser client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Result of one command, or a failure to run it
    Output {
        message: String,
        #[serde(rename = "isError")]
        is_error: bool,
        /// Connection generation the command ran against
        #[serde(default, skip_serializing_if = "Option::is_none")]
        generation: Option<u64>,
        /// Set when the session was reconfigured while the command ran
        #[serde(default, skip_serializing_if = "is_false")]
        stale: bool,
    },
    /// Session state changed
    Session {
        state: SessionState,
        generation: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ServerMessage {
    /// Build a plain output event with no generation tag
    pub fn output(message: impl Into<String>, is_error: bool) -> Self {
        ServerMessage::Output {
            message: message.into(),
            is_error,
            generation: None,
            stale: false,
        }
    }

    /// Build an error output event
    pub fn error(message: impl Into<String>) -> Self {
        Self::output(message, true)
    }

    /// Whether this is an error output event
    pub fn is_error(&self) -> bool {
        matches!(self, ServerMessage::Output { is_error: true, .. })
    }

    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
