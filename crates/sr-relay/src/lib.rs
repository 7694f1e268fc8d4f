//! sr-relay: Relay daemon between browser consoles and one SSH session
//!
//! The daemon owns a single SSH connection, shared by every attached
//! browser client. Clients submit the connection settings over HTTP and
//! issue commands over a WebSocket; each command runs in a fresh remote
//! execution channel and its aggregated output is pushed back to the
//! client that asked for it.

pub mod executor;
pub mod relay;
pub mod server;
pub mod session;
pub mod ssh;
pub mod state;
#[doc(hidden)]
pub mod testing;

pub use executor::CommandExecutor;
pub use relay::{RelayController, RelayHub};
pub use session::{Lease, SessionManager};
pub use state::RelayState;
