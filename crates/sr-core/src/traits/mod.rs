//! Core trait definitions

mod connection;

pub use connection::{Connector, ExecChunk, ExecStream, RemoteConnection};
