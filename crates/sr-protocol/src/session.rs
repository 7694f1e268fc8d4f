//! Session state as seen on the wire

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the shared SSH session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No connection and none being attempted
    #[default]
    Disconnected,
    /// A connection attempt is in flight
    Connecting,
    /// Connected and authenticated; commands may run
    Ready,
    /// The last connection attempt failed
    Failed,
}

impl SessionState {
    /// Whether commands may be executed in this state
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready)
    }

    /// Whether a connection is open or being opened
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Ready | SessionState::Connecting)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Ready => write!(f, "ready"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}
