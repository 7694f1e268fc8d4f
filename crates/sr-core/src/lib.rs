//! sr-core: Core abstractions and configuration for shell-relay
//!
//! This crate provides the domain types, error taxonomy, configuration
//! structures and the connection traits shared by the relay daemon, plus
//! the two pure helpers the browser console relies on: the command alias
//! table and the lexical tagger.

pub mod aliases;
pub mod config;
pub mod error;
pub mod lexer;
pub mod traits;
pub mod types;

pub use aliases::AliasTable;
pub use error::{ConnectionError, RelayError};
pub use types::{
    ClientId, CommandRequest, ExecutionResult, Generation, SessionConfig, SessionState,
    SessionStatus,
};
