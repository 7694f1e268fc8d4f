//! Attached client registry
//!
//! Tracks the transport clients sharing the session and applies the
//! detach policy when one of them goes away.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;

use sr_core::config::DetachPolicy;
use sr_core::ClientId;

use crate::session::SessionManager;

/// A client attached over the transport channel
#[derive(Debug, Clone)]
struct AttachedClient {
    attached_at: Instant,
}

/// Registry of attached clients
pub struct RelayHub {
    /// Clients indexed by ID
    clients: DashMap<ClientId, AttachedClient>,
    /// Session to tear down on detach
    sessions: Arc<SessionManager>,
    /// When detaching tears the session down
    policy: DetachPolicy,
}

impl RelayHub {
    /// Create a new, empty hub
    pub fn new(sessions: Arc<SessionManager>, policy: DetachPolicy) -> Self {
        Self {
            clients: DashMap::new(),
            sessions,
            policy,
        }
    }

    /// Register a newly connected client
    pub fn attach(&self) -> ClientId {
        let id = ClientId::new();
        self.clients.insert(
            id,
            AttachedClient {
                attached_at: Instant::now(),
            },
        );
        tracing::info!("Client attached: {} ({} attached)", id, self.clients.len());
        id
    }

    /// Unregister a client and apply the detach policy
    ///
    /// Returns `true` when the session was torn down as a result.
    pub fn detach(&self, id: ClientId) -> bool {
        let Some((_, client)) = self.clients.remove(&id) else {
            return false;
        };

        let remaining = self.clients.len();
        tracing::info!(
            "Client detached: {} after {:?} ({} attached)",
            id,
            client.attached_at.elapsed(),
            remaining
        );

        let teardown = match self.policy {
            DetachPolicy::LastClient => self.is_empty(),
            DetachPolicy::AnyClient => true,
        };
        if teardown && self.sessions.current_state().is_open() {
            tracing::info!("Closing SSH session after {} detached", id);
            self.sessions.teardown();
            return true;
        }
        false
    }

    /// Number of attached clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no client is attached
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeConnector;
    use sr_core::traits::Connector;
    use sr_core::{SessionConfig, SessionState};
    use std::time::Duration;

    async fn ready_session() -> Arc<SessionManager> {
        let connector: Arc<dyn Connector> = FakeConnector::new();
        let sessions = Arc::new(SessionManager::new(connector, Duration::from_secs(5)));
        sessions.configure(SessionConfig::new("h", 22, "ops", "x"));
        let mut rx = sessions.subscribe();
        rx.wait_for(|s| s.state == SessionState::Ready).await.unwrap();
        sessions
    }

    #[tokio::test]
    async fn test_last_client_policy_keeps_session_for_remaining_clients() {
        let sessions = ready_session().await;
        let hub = RelayHub::new(Arc::clone(&sessions), DetachPolicy::LastClient);

        let a = hub.attach();
        let b = hub.attach();
        assert_eq!(hub.len(), 2);

        assert!(!hub.detach(a));
        assert_eq!(sessions.current_state(), SessionState::Ready);

        assert!(hub.detach(b));
        assert!(hub.is_empty());
        assert_eq!(sessions.current_state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn test_any_client_policy_tears_down_on_first_detach() {
        let sessions = ready_session().await;
        let hub = RelayHub::new(Arc::clone(&sessions), DetachPolicy::AnyClient);

        let a = hub.attach();
        let _b = hub.attach();

        assert!(hub.detach(a));
        assert_eq!(sessions.current_state(), SessionState::Disconnected);
        assert_eq!(hub.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_client_detach_is_ignored() {
        let sessions = ready_session().await;
        let hub = RelayHub::new(Arc::clone(&sessions), DetachPolicy::LastClient);

        assert!(!hub.detach(ClientId::new()));
        assert_eq!(sessions.current_state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_detach_without_open_session() {
        let connector: Arc<dyn Connector> = FakeConnector::new();
        let sessions = Arc::new(SessionManager::new(connector, Duration::from_secs(5)));
        let hub = RelayHub::new(Arc::clone(&sessions), DetachPolicy::LastClient);

        let a = hub.attach();
        assert_eq!(hub.len(), 1);
        assert!(!hub.detach(a));
        assert!(hub.is_empty());
    }
}
