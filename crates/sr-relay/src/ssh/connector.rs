//! Outbound SSH connector
//!
//! Opens one password-authenticated SSH session per configuration. Every
//! command runs in its own `exec` channel on that session.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use russh::client::{self, Config, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;

use sr_core::error::ConnectionError;
use sr_core::traits::{Connector, ExecChunk, ExecStream, RemoteConnection};
use sr_core::SessionConfig;

/// Extended data stream carrying standard error
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// Connects to remote hosts with password authentication
#[derive(Debug, Clone, Default)]
pub struct SshConnector {
    /// Expected host key fingerprint; a mismatch is logged
    host_key_fingerprint: Option<String>,
}

impl SshConnector {
    /// Create a new connector
    pub fn new(host_key_fingerprint: Option<String>) -> Self {
        Self {
            host_key_fingerprint,
        }
    }
}

fn map_connect_error(address: &str, err: russh::Error) -> ConnectionError {
    match err {
        russh::Error::IO(e) => ConnectionError::Unreachable {
            address: address.to_string(),
            reason: e.to_string(),
        },
        russh::Error::UnknownKey => ConnectionError::HostKeyRejected(address.to_string()),
        other => ConnectionError::Ssh(format!("Failed to connect to {}: {}", address, other)),
    }
}

#[async_trait]
impl Connector for SshConnector {
    async fn connect(
        &self,
        config: &SessionConfig,
    ) -> Result<Arc<dyn RemoteConnection>, ConnectionError> {
        let address = config.address();
        let ssh_config = Arc::new(Config::default());
        let handler = ClientHandler::new(self.host_key_fingerprint.clone());

        tracing::debug!("Connecting to {}", address);
        let mut handle = client::connect(ssh_config, (config.host.as_str(), config.port), handler)
            .await
            .map_err(|e| map_connect_error(&address, e))?;

        tracing::debug!("Authenticating as user '{}'", config.username);
        let authenticated = handle
            .authenticate_password(&config.username, &config.credential)
            .await
            .map_err(|e| ConnectionError::Ssh(format!("Authentication error: {}", e)))?;

        if !authenticated {
            return Err(ConnectionError::AuthenticationFailed {
                username: config.username.clone(),
            });
        }

        tracing::info!("Authenticated to {} as '{}'", address, config.username);
        Ok(Arc::new(SshConnection { handle, address }))
    }
}

/// An authenticated SSH session
pub struct SshConnection {
    handle: Handle<ClientHandler>,
    address: String,
}

struct ExecChannel {
    channel: Channel<Msg>,
    exited: bool,
}

fn aborted(reason: &str) -> ConnectionError {
    ConnectionError::Aborted(reason.to_string())
}

/// Turn the messages of one exec channel into output chunks
///
/// The stream ends on `Close`. A refused exec, or a session that drops
/// before the command reported its exit status, ends it with an error.
fn channel_output(channel: Channel<Msg>) -> ExecStream {
    let state = ExecChannel {
        channel,
        exited: false,
    };

    futures::stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            let chunk = match state.channel.wait().await {
                Some(ChannelMsg::Data { data }) => ExecChunk::Stdout(Bytes::copy_from_slice(&data)),
                Some(ChannelMsg::ExtendedData { data, ext }) if ext == SSH_EXTENDED_DATA_STDERR => {
                    ExecChunk::Stderr(Bytes::copy_from_slice(&data))
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    state.exited = true;
                    ExecChunk::ExitStatus(exit_status)
                }
                Some(ChannelMsg::Close) => return None,
                Some(ChannelMsg::Failure) => {
                    return Some((Err(aborted("remote refused to run the command")), None));
                }
                Some(_) => continue,
                None if state.exited => return None,
                None => {
                    return Some((
                        Err(aborted("connection closed before the command finished")),
                        None,
                    ));
                }
            };
            return Some((Ok(chunk), Some(state)));
        }
    })
    .boxed()
}

#[async_trait]
impl RemoteConnection for SshConnection {
    async fn exec(&self, command_line: &str) -> Result<ExecStream, ConnectionError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ConnectionError::Ssh(format!("Failed to open channel: {}", e)))?;

        channel
            .exec(true, command_line)
            .await
            .map_err(|e| ConnectionError::Ssh(e.to_string()))?;

        Ok(channel_output(channel))
    }

    fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    async fn close(&self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "closing", "en")
            .await
        {
            tracing::debug!("Error disconnecting from {}: {}", self.address, e);
        }
    }
}

/// SSH client handler for the relay
struct ClientHandler {
    /// Expected host key fingerprint
    expected_host_key: Option<String>,
}

impl ClientHandler {
    fn new(expected_host_key: Option<String>) -> Self {
        Self { expected_host_key }
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    /// Accept the server key, logging it against the configured fingerprint
    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        tracing::debug!("Server host key: {}", fingerprint);

        if let Some(expected) = &self.expected_host_key {
            if fingerprint == *expected {
                tracing::debug!("Host key matches configured fingerprint");
            } else {
                tracing::warn!(
                    "Host key differs from configured: expected {}, got {}",
                    expected,
                    fingerprint
                );
            }
        }

        Ok(true)
    }
}
