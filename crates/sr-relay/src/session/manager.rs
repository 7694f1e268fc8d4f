//! Session manager implementation
//!
//! Owns the single SSH connection shared by every client. All state
//! transitions happen under one mutex that is never held across an
//! `.await`; observers follow them through a `watch` channel, which only
//! ever holds the latest status.
//!
//! # Generations
//!
//! Every `configure` and every effective `teardown` bumps the connection
//! generation. A connection attempt that completes after its generation was
//! superseded is discarded (and its connection closed), and results of
//! commands that ran against an older generation can be recognised as
//! stale by the relay.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use sr_core::error::{ConnectionError, RelayError};
use sr_core::traits::{Connector, RemoteConnection};
use sr_core::{Generation, SessionConfig, SessionState, SessionStatus};

/// A ready connection handed out for one command
#[derive(Clone)]
pub struct Lease {
    pub connection: Arc<dyn RemoteConnection>,
    pub generation: Generation,
}

/// Owner of the shared SSH session
pub struct SessionManager {
    /// Establishes new connections
    connector: Arc<dyn Connector>,
    /// Upper bound on one connection attempt
    connect_timeout: Duration,
    /// Mutable session slot
    inner: Mutex<Inner>,
    /// Latest published status
    status_tx: watch::Sender<SessionStatus>,
}

struct Inner {
    config: Option<SessionConfig>,
    generation: Generation,
    state: SessionState,
    connection: Option<Arc<dyn RemoteConnection>>,
    connect_task: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Create a new session manager with no configuration
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::default());
        Self {
            connector,
            connect_timeout,
            inner: Mutex::new(Inner {
                config: None,
                generation: Generation::INITIAL,
                state: SessionState::Disconnected,
                connection: None,
                connect_task: None,
            }),
            status_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the configuration and start connecting with it
    ///
    /// Any open or opening connection is dropped first; its close runs in
    /// the background and is not awaited. The state is `Connecting` by the
    /// time this returns.
    pub fn configure(self: &Arc<Self>, config: SessionConfig) -> Generation {
        let mut inner = self.lock();

        let generation = inner.generation.next();
        inner.generation = generation;
        Self::release(&mut inner);

        tracing::info!(
            "Session configured for {}@{} ({})",
            config.username,
            config.address(),
            generation
        );
        inner.config = Some(config.clone());
        self.publish(&mut inner, SessionStatus::new(SessionState::Connecting, generation));

        let manager = Arc::clone(self);
        inner.connect_task = Some(tokio::spawn(async move {
            manager.run_connect(config, generation).await;
        }));

        generation
    }

    /// Close the session explicitly
    ///
    /// No-op when nothing is open or opening.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        if !inner.state.is_open() {
            return;
        }

        inner.generation = inner.generation.next();
        Self::release(&mut inner);

        let generation = inner.generation;
        tracing::info!("Session torn down ({})", generation);
        self.publish(&mut inner, SessionStatus::new(SessionState::Disconnected, generation));
    }

    /// Current lifecycle state
    pub fn current_state(&self) -> SessionState {
        self.lock().state
    }

    /// Latest published status
    pub fn status(&self) -> SessionStatus {
        self.status_tx.borrow().clone()
    }

    /// Current connection generation
    pub fn current_generation(&self) -> Generation {
        self.lock().generation
    }

    /// Whether `generation` is still the live one
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current_generation() == generation
    }

    /// Whether a configuration was ever submitted
    pub fn has_config(&self) -> bool {
        self.lock().config.is_some()
    }

    /// Follow status changes; only the latest status is retained
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Hand out the ready connection for one command
    pub fn lease(&self) -> Result<Lease, RelayError> {
        let inner = self.lock();
        if inner.config.is_none() {
            return Err(RelayError::ConfigurationMissing);
        }

        match (inner.state, &inner.connection) {
            (state, Some(connection)) if state.is_ready() => Ok(Lease {
                connection: Arc::clone(connection),
                generation: inner.generation,
            }),
            (state, _) => Err(RelayError::SessionNotReady(state)),
        }
    }

    /// Notice a connection the remote end has closed
    ///
    /// Returns `true` when the session moved to `Disconnected`.
    pub fn check_liveness(&self) -> bool {
        let mut inner = self.lock();
        let closed = inner.state == SessionState::Ready
            && inner
                .connection
                .as_ref()
                .is_some_and(|connection| connection.is_closed());
        if !closed {
            return false;
        }

        inner.connection = None;
        let generation = inner.generation;
        tracing::warn!("SSH connection closed by remote ({})", generation);
        self.publish(&mut inner, SessionStatus::new(SessionState::Disconnected, generation));
        true
    }

    async fn run_connect(self: Arc<Self>, config: SessionConfig, generation: Generation) {
        let address = config.address();
        tracing::debug!("Connecting to {} ({})", address, generation);

        let result =
            match tokio::time::timeout(self.connect_timeout, self.connector.connect(&config)).await
            {
                Ok(result) => result,
                Err(_) => Err(ConnectionError::Timeout {
                    address,
                    timeout: self.connect_timeout,
                }),
            };

        self.finish_connect(generation, result);
    }

    fn finish_connect(
        &self,
        generation: Generation,
        result: Result<Arc<dyn RemoteConnection>, ConnectionError>,
    ) {
        let mut inner = self.lock();

        if inner.generation != generation {
            tracing::debug!(
                "Discarding connection attempt for {} (current is {})",
                generation,
                inner.generation
            );
            if let Ok(connection) = result {
                tokio::spawn(async move { connection.close().await });
            }
            return;
        }

        inner.connect_task = None;
        match result {
            Ok(connection) => {
                inner.connection = Some(connection);
                tracing::info!("SSH connection established ({})", generation);
                self.publish(&mut inner, SessionStatus::new(SessionState::Ready, generation));
            }
            Err(e) => {
                tracing::warn!("SSH connection failed ({}): {}", generation, e);
                self.publish(&mut inner, SessionStatus::failed(generation, e.to_string()));
            }
        }
    }

    /// Drop the current connection and any attempt in flight
    fn release(inner: &mut Inner) {
        if let Some(task) = inner.connect_task.take() {
            task.abort();
        }
        if let Some(connection) = inner.connection.take() {
            tokio::spawn(async move { connection.close().await });
        }
    }

    fn publish(&self, inner: &mut Inner, status: SessionStatus) {
        inner.state = status.state;
        self.status_tx.send_replace(status);
    }
}
