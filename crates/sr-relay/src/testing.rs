//! In-process stand-ins for the SSH seam
//!
//! `FakeConnector` hands out `FakeConnection`s that answer commands from a
//! table of canned replies, so the session manager, executor and relay can
//! be exercised without a remote host.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use sr_core::error::ConnectionError;
use sr_core::traits::{Connector, ExecChunk, ExecStream, RemoteConnection};
use sr_core::SessionConfig;

/// Canned output for one command line
#[derive(Debug, Clone, Default)]
pub struct FakeReply {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: Option<u32>,
    pub delay: Option<Duration>,
    /// End the output with this error instead of an exit status
    pub abort: Option<String>,
}

impl FakeReply {
    pub fn stdout(text: impl Into<String>) -> Self {
        Self {
            stdout: text.into(),
            exit_status: Some(0),
            ..Default::default()
        }
    }

    pub fn stderr(text: impl Into<String>) -> Self {
        Self {
            stderr: text.into(),
            exit_status: Some(1),
            ..Default::default()
        }
    }

    /// Hold the output back for `delay` after the channel opens
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Lose the channel after the output, before any exit status
    pub fn aborted(mut self, reason: impl Into<String>) -> Self {
        self.abort = Some(reason.into());
        self.exit_status = None;
        self
    }

    /// Output as the remote would stream it: every buffer in two halves
    fn chunks(&self) -> Vec<Result<ExecChunk, ConnectionError>> {
        let mut chunks = Vec::new();
        for (text, stderr) in [(&self.stdout, false), (&self.stderr, true)] {
            let bytes = Bytes::copy_from_slice(text.as_bytes());
            let mid = bytes.len() / 2;
            for part in [bytes.slice(..mid), bytes.slice(mid..)] {
                if part.is_empty() {
                    continue;
                }
                chunks.push(Ok(if stderr {
                    ExecChunk::Stderr(part)
                } else {
                    ExecChunk::Stdout(part)
                }));
            }
        }
        if let Some(reason) = &self.abort {
            chunks.push(Err(ConnectionError::Aborted(reason.clone())));
        } else if let Some(status) = self.exit_status {
            chunks.push(Ok(ExecChunk::ExitStatus(status)));
        }
        chunks
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A connection that replays canned replies
#[derive(Default)]
pub struct FakeConnection {
    replies: Mutex<HashMap<String, FakeReply>>,
    executed: Mutex<Vec<String>>,
    closed: AtomicBool,
    refuse_exec: AtomicBool,
}

impl FakeConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register the reply for an exact command line
    pub fn reply(&self, command_line: impl Into<String>, reply: FakeReply) {
        lock(&self.replies).insert(command_line.into(), reply);
    }

    /// Command lines executed so far, in order
    pub fn executed(&self) -> Vec<String> {
        lock(&self.executed).clone()
    }

    /// Simulate the remote end dropping the transport
    pub fn drop_transport(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Make every following `exec` fail to open a channel
    pub fn refuse_exec(&self) {
        self.refuse_exec.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteConnection for FakeConnection {
    async fn exec(&self, command_line: &str) -> Result<ExecStream, ConnectionError> {
        if self.is_closed() || self.refuse_exec.load(Ordering::SeqCst) {
            return Err(ConnectionError::Ssh("channel open failure".to_string()));
        }

        lock(&self.executed).push(command_line.to_string());
        let reply = lock(&self.replies)
            .get(command_line)
            .cloned()
            .unwrap_or_default();

        let chunks = reply.chunks();
        let delay = reply.delay;
        let stream = futures::stream::once(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        })
        .flat_map(move |_| futures::stream::iter(chunks.clone()));

        Ok(stream.boxed())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// How the next connection attempts behave
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    Succeed,
    Fail(ConnectionError),
    /// Never complete; only a timeout or a newer configuration ends it
    Hang,
}

/// Connector producing [`FakeConnection`]s
pub struct FakeConnector {
    behavior: Mutex<ConnectBehavior>,
    delay: Mutex<Option<Duration>>,
    replies: Mutex<HashMap<String, FakeReply>>,
    connections: Mutex<Vec<Arc<FakeConnection>>>,
    attempts: AtomicUsize,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(ConnectBehavior::Succeed),
            delay: Mutex::new(None),
            replies: Mutex::new(HashMap::new()),
            connections: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn set_behavior(&self, behavior: ConnectBehavior) {
        *lock(&self.behavior) = behavior;
    }

    /// Delay every following connection attempt
    pub fn set_connect_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    /// Register a reply on existing and future connections
    pub fn reply(&self, command_line: impl Into<String>, reply: FakeReply) {
        let command_line = command_line.into();
        for conn in lock(&self.connections).iter() {
            conn.reply(command_line.clone(), reply.clone());
        }
        lock(&self.replies).insert(command_line, reply);
    }

    /// Number of connection attempts started
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Every connection handed out so far
    pub fn connections(&self) -> Vec<Arc<FakeConnection>> {
        lock(&self.connections).clone()
    }

    /// The most recent connection, if any
    pub fn latest(&self) -> Option<Arc<FakeConnection>> {
        lock(&self.connections).last().cloned()
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(
        &self,
        _config: &SessionConfig,
    ) -> Result<Arc<dyn RemoteConnection>, ConnectionError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let behavior = lock(&self.behavior).clone();
        match behavior {
            ConnectBehavior::Succeed => {
                let conn = FakeConnection::new();
                for (line, reply) in lock(&self.replies).iter() {
                    conn.reply(line.clone(), reply.clone());
                }
                lock(&self.connections).push(Arc::clone(&conn));
                Ok(conn as Arc<dyn RemoteConnection>)
            }
            ConnectBehavior::Fail(err) => Err(err),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }
}
