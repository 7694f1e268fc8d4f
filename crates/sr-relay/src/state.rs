//! Global relay state

use std::sync::Arc;
use std::time::Instant;

use sr_core::config::RelayConfig;
use sr_core::traits::Connector;
use sr_core::AliasTable;

use crate::executor::CommandExecutor;
use crate::relay::{RelayController, RelayHub};
use crate::session::SessionManager;

/// Global state for the relay daemon
pub struct RelayState {
    /// Configuration
    pub config: RelayConfig,
    /// The shared SSH session
    pub sessions: Arc<SessionManager>,
    /// Attached transport clients
    pub hub: Arc<RelayHub>,
    /// Command relay
    pub relay: Arc<RelayController>,
    /// Command aliases
    pub aliases: Arc<AliasTable>,
    /// When the daemon started
    pub started_at: Instant,
}

impl RelayState {
    /// Create new relay state with the default alias table
    pub fn new(config: RelayConfig, connector: Arc<dyn Connector>) -> Self {
        Self::with_aliases(config, connector, AliasTable::default())
    }

    /// Create new relay state with a custom alias table
    pub fn with_aliases(
        config: RelayConfig,
        connector: Arc<dyn Connector>,
        aliases: AliasTable,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(connector, config.connect_timeout));
        let hub = Arc::new(RelayHub::new(Arc::clone(&sessions), config.detach_policy));
        let relay = Arc::new(RelayController::new(
            Arc::clone(&sessions),
            CommandExecutor::new(config.command_timeout),
        ));

        Self {
            config,
            sessions,
            hub,
            relay,
            aliases: Arc::new(aliases),
            started_at: Instant::now(),
        }
    }

    /// Translate a typed command name when alias translation is enabled
    pub fn resolve_command<'a>(&'a self, name: &'a str) -> &'a str {
        if self.config.translate_aliases {
            self.aliases.translate(name)
        } else {
            name
        }
    }
}
