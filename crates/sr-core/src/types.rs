//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ConfigError;
use sr_protocol::ConfigRequest;

pub use sr_protocol::SessionState;

/// Port used when a client leaves it blank
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Connection generation
///
/// Bumped every time the session is reconfigured or torn down, so a result
/// can be matched against the connection that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    /// Generation before any configuration was submitted
    pub const INITIAL: Generation = Generation(0);

    /// The following generation
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Get the raw value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Credentials and address of the remote host
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub credential: String,
}

impl SessionConfig {
    /// Create a new session config
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            credential: credential.into(),
        }
    }

    /// `host:port` as passed to the socket layer
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("credential", &"<redacted>")
            .finish()
    }
}

impl TryFrom<ConfigRequest> for SessionConfig {
    type Error = ConfigError;

    fn try_from(req: ConfigRequest) -> Result<Self, Self::Error> {
        let host = req.host.trim();
        if host.is_empty() {
            return Err(ConfigError::InvalidSession("host is required".to_string()));
        }

        let port = req.port.unwrap_or(DEFAULT_SSH_PORT);
        if port == 0 {
            return Err(ConfigError::InvalidSession("port must be non-zero".to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            username: req.username,
            credential: req.credential,
        })
    }
}

/// Snapshot of the session lifecycle, published to observers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub state: SessionState,
    pub generation: Generation,
    /// Reason of the last failure while `state` is `Failed`
    pub error: Option<String>,
}

impl SessionStatus {
    /// Status with no error attached
    pub fn new(state: SessionState, generation: Generation) -> Self {
        Self {
            state,
            generation,
            error: None,
        }
    }

    /// Failed status carrying its reason
    pub fn failed(generation: Generation, error: impl Into<String>) -> Self {
        Self {
            state: SessionState::Failed,
            generation,
            error: Some(error.into()),
        }
    }
}

/// One command issued by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command_name: String,
    pub arguments: Vec<String>,
}

impl CommandRequest {
    /// Create a new command request
    pub fn new(command_name: impl Into<String>, arguments: Vec<String>) -> Self {
        Self {
            command_name: command_name.into(),
            arguments,
        }
    }

    /// Full command line sent to the remote shell
    ///
    /// Arguments are space-joined verbatim. Nothing is quoted or escaped, so
    /// shell metacharacters reach the remote shell as typed.
    pub fn command_line(&self) -> String {
        if self.arguments.is_empty() {
            return self.command_name.clone();
        }
        format!("{} {}", self.command_name, self.arguments.join(" "))
    }
}

/// Aggregated outcome of one remote execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    stdout: String,
    stderr: String,
    succeeded: bool,
    exit_status: Option<u32>,
    generation: Generation,
}

impl ExecutionResult {
    /// Build a result from the collected streams
    ///
    /// Any stderr output marks the result failed, whatever the exit status.
    pub fn new(
        stdout: String,
        stderr: String,
        exit_status: Option<u32>,
        generation: Generation,
    ) -> Self {
        let succeeded = stderr.is_empty();
        Self {
            stdout,
            stderr,
            succeeded,
            exit_status,
            generation,
        }
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn exit_status(&self) -> Option<u32> {
        self.exit_status
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The payload shown to the client: stderr on failure, stdout otherwise
    pub fn message(&self) -> &str {
        if self.succeeded {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Identifier of an attached transport client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Allocate a fresh client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", &self.0.simple().to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(host: &str, port: Option<u16>) -> ConfigRequest {
        ConfigRequest {
            host: host.to_string(),
            port,
            username: "ops".to_string(),
            credential: "x".to_string(),
        }
    }

    #[test]
    fn test_command_line_joins_with_spaces() {
        let req = CommandRequest::new("grep", vec!["foo".into(), "missing.txt".into()]);
        assert_eq!(req.command_line(), "grep foo missing.txt");
    }

    #[test]
    fn test_command_line_without_arguments() {
        assert_eq!(CommandRequest::new("ls", vec![]).command_line(), "ls");
    }

    #[test]
    fn test_command_line_does_not_escape() {
        let req = CommandRequest::new("echo", vec!["$HOME;".into(), "|".into(), "wc".into()]);
        assert_eq!(req.command_line(), "echo $HOME; | wc");
    }

    #[test]
    fn test_stderr_wins_over_stdout() {
        let result = ExecutionResult::new(
            "partial\n".to_string(),
            "grep: missing.txt: No such file or directory\n".to_string(),
            Some(2),
            Generation(1),
        );
        assert!(!result.succeeded());
        assert_eq!(
            result.message(),
            "grep: missing.txt: No such file or directory\n"
        );
    }

    #[test]
    fn test_stdout_surfaced_when_stderr_empty() {
        let result = ExecutionResult::new(
            "a.txt\nb.txt\n".to_string(),
            String::new(),
            Some(0),
            Generation(1),
        );
        assert!(result.succeeded());
        assert_eq!(result.message(), "a.txt\nb.txt\n");
    }

    #[test]
    fn test_exit_status_does_not_decide_success() {
        let result = ExecutionResult::new(String::new(), String::new(), Some(1), Generation(4));
        assert!(result.succeeded());
        assert_eq!(result.exit_status(), Some(1));
        assert_eq!(result.generation(), Generation(4));
    }

    #[test]
    fn test_session_config_from_request() {
        let cfg = SessionConfig::try_from(request(" 10.0.0.5 ", Some(2222))).unwrap();
        assert_eq!(cfg.host, "10.0.0.5");
        assert_eq!(cfg.address(), "10.0.0.5:2222");

        let cfg = SessionConfig::try_from(request("example.org", None)).unwrap();
        assert_eq!(cfg.port, DEFAULT_SSH_PORT);
    }

    #[test]
    fn test_session_config_rejects_bad_input() {
        assert!(SessionConfig::try_from(request("  ", Some(22))).is_err());
        assert!(SessionConfig::try_from(request("h", Some(0))).is_err());
    }

    #[test]
    fn test_session_config_debug_redacts() {
        let cfg = SessionConfig::new("h", 22, "ops", "s3cret");
        assert!(!format!("{:?}", cfg).contains("s3cret"));
    }

    #[test]
    fn test_generation_ordering() {
        let g = Generation::INITIAL;
        assert!(g.next() > g);
        assert_eq!(format!("{}", g.next()), "gen-1");
    }
}
