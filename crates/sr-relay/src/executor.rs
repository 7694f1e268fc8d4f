//! Remote command execution
//!
//! Runs one command line in a fresh execution channel and folds its output
//! into a single [`ExecutionResult`]. Standard output and standard error are
//! buffered separately and decoded only once the remote closes the channel,
//! so multi-byte characters split across packets survive intact.

use std::time::Duration;

use bytes::BytesMut;
use futures::StreamExt;

use sr_core::error::RelayError;
use sr_core::traits::{ExecChunk, ExecStream};
use sr_core::{ExecutionResult, Generation};

use crate::session::Lease;

/// Executes commands against a leased connection
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor {
    /// Upper bound on one command; `None` waits forever
    timeout: Option<Duration>,
}

impl CommandExecutor {
    /// Create a new executor
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run `command_line` and wait for the remote process to finish
    ///
    /// The caller is responsible for only passing a lease of a ready
    /// session; the executor does not look at session state.
    pub async fn execute(
        &self,
        lease: &Lease,
        command_line: &str,
    ) -> Result<ExecutionResult, RelayError> {
        let stream = lease
            .connection
            .exec(command_line)
            .await
            .map_err(|e| RelayError::ExecutionStart(e.to_string()))?;

        let output = collect_output(stream, lease.generation);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, output)
                .await
                .map_err(|_| RelayError::CommandTimeout(limit))??,
            None => output.await?,
        };

        tracing::debug!(
            "Command '{}' finished ({}): {} bytes stdout, {} bytes stderr, exit {:?}",
            command_line,
            result.generation(),
            result.stdout().len(),
            result.stderr().len(),
            result.exit_status()
        );

        Ok(result)
    }
}

/// Drain the channel; a stream that ends in an error discards partial output
async fn collect_output(
    mut stream: ExecStream,
    generation: Generation,
) -> Result<ExecutionResult, RelayError> {
    let mut stdout = BytesMut::new();
    let mut stderr = BytesMut::new();
    let mut exit_status = None;

    while let Some(chunk) = stream.next().await {
        match chunk? {
            ExecChunk::Stdout(data) => stdout.extend_from_slice(&data),
            ExecChunk::Stderr(data) => stderr.extend_from_slice(&data),
            ExecChunk::ExitStatus(status) => exit_status = Some(status),
        }
    }

    Ok(ExecutionResult::new(
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
        exit_status,
        generation,
    ))
}
