//! Core error types for shell-relay

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::SessionState;

/// Errors surfaced to the client that issued a command
///
/// Every variant is terminal for the single request that triggered it.
#[derive(Error, Debug)]
pub enum RelayError {
    /// No session configuration has ever been submitted
    #[error("SSH connection is not configured")]
    ConfigurationMissing,

    /// A command arrived while the session was not ready
    #[error("SSH session is not connected ({0})")]
    SessionNotReady(SessionState),

    /// The SSH connection itself failed
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The remote execution channel could not be opened
    #[error("Failed to execute command: {0}")]
    ExecutionStart(String),

    /// The remote command did not finish in time
    #[error("Command timed out after {0:?}")]
    CommandTimeout(Duration),
}

/// SSH connection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Host could not be reached
    #[error("Failed to connect to {address}: {reason}")]
    Unreachable { address: String, reason: String },

    /// The server rejected the credentials
    #[error("Authentication failed for user '{username}'")]
    AuthenticationFailed { username: String },

    /// Handshake did not complete in time
    #[error("Connection to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    /// Server host key was rejected
    #[error("Host key verification failed: {0}")]
    HostKeyRejected(String),

    /// Any other SSH protocol failure
    #[error("SSH error: {0}")]
    Ssh(String),

    /// An execution channel ended before the remote closed it
    #[error("Command aborted: {0}")]
    Aborted(String),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Session configuration submitted by a client is unusable
    #[error("Invalid session config: {0}")]
    InvalidSession(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visible_messages() {
        assert_eq!(
            RelayError::ConfigurationMissing.to_string(),
            "SSH connection is not configured"
        );
        assert!(RelayError::SessionNotReady(SessionState::Connecting)
            .to_string()
            .starts_with("SSH session is not connected"));
        assert_eq!(
            RelayError::SessionNotReady(SessionState::Failed).to_string(),
            "SSH session is not connected (failed)"
        );
        assert_eq!(
            RelayError::ExecutionStart("channel closed".to_string()).to_string(),
            "Failed to execute command: channel closed"
        );
    }

    #[test]
    fn test_connection_error_converts() {
        let err: RelayError = ConnectionError::AuthenticationFailed {
            username: "ops".to_string(),
        }
        .into();
        assert!(matches!(err, RelayError::Connection(_)));
        assert!(err.to_string().contains("'ops'"));
    }
}
