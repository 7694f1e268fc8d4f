//! Connection traits
//!
//! The relay only talks to the remote host through these two traits, so the
//! SSH implementation can be swapped for an in-process fake in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;

use crate::error::ConnectionError;
use crate::types::SessionConfig;

/// One piece of output from a remote execution channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecChunk {
    /// Bytes written to standard output
    Stdout(Bytes),
    /// Bytes written to standard error
    Stderr(Bytes),
    /// Exit status reported by the remote process
    ExitStatus(u32),
}

/// Output of one remote execution
///
/// Ends after the remote closes the channel. A channel that goes away any
/// other way yields one final `Err` item instead.
pub type ExecStream = BoxStream<'static, Result<ExecChunk, ConnectionError>>;

/// An established, authenticated connection to the remote host
#[async_trait]
pub trait RemoteConnection: Send + Sync {
    /// Open a fresh execution channel running `command_line`
    async fn exec(&self, command_line: &str) -> Result<ExecStream, ConnectionError>;

    /// Whether the underlying transport has gone away
    fn is_closed(&self) -> bool;

    /// Close the connection; errors are logged, not returned
    async fn close(&self);
}

/// Establishes connections from a session config
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and authenticate
    async fn connect(
        &self,
        config: &SessionConfig,
    ) -> Result<Arc<dyn RemoteConnection>, ConnectionError>;
}
