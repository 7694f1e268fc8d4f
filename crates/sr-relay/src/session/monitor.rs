//! Connection liveness monitor
//!
//! The SSH library does not report a dropped transport on its own, so this
//! task polls the session and moves it to `Disconnected` once the remote
//! end has gone away. Clients then see the state change and get a
//! "not connected" error instead of a channel failure.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::SessionManager;

/// Run the liveness monitor until `cancel` fires
pub async fn run_liveness_monitor(
    sessions: Arc<SessionManager>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::debug!("Starting liveness monitor (interval: {:?})", interval);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sessions.check_liveness();
            }
            _ = cancel.cancelled() => {
                tracing::debug!("Liveness monitor shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeConnector;
    use sr_core::traits::Connector;
    use sr_core::{SessionConfig, SessionState};

    #[tokio::test(start_paused = true)]
    async fn test_monitor_marks_dropped_connection() {
        let connector = FakeConnector::new();
        let dyn_connector: Arc<dyn Connector> = connector.clone();
        let sessions = Arc::new(SessionManager::new(dyn_connector, Duration::from_secs(5)));

        sessions.configure(SessionConfig::new("h", 22, "ops", "x"));
        let mut rx = sessions.subscribe();
        rx.wait_for(|s| s.state == SessionState::Ready).await.unwrap();

        let cancel = CancellationToken::new();
        let monitor = tokio::spawn(run_liveness_monitor(
            Arc::clone(&sessions),
            Duration::from_secs(1),
            cancel.clone(),
        ));

        connector.latest().unwrap().drop_transport();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(sessions.current_state(), SessionState::Disconnected);

        cancel.cancel();
        monitor.await.unwrap();
    }
}
