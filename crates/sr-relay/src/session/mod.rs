//! Session management

mod manager;
mod monitor;

pub use manager::{Lease, SessionManager};
pub use monitor::run_liveness_monitor;
