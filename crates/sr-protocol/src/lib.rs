//! sr-protocol: Transport channel wire types for shell-relay
//!
//! This crate defines the JSON messages exchanged between browser clients
//! and the relay daemon: WebSocket frames in both directions and the bodies
//! of the plain HTTP endpoints.

pub mod error;
pub mod http;
pub mod message;
pub mod session;

pub use error::ProtocolError;
pub use http::{ClassifyRequest, ConfigRequest, RelayStatus};
pub use message::{ClientMessage, ServerMessage};
pub use session::SessionState;
