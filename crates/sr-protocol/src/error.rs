//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding transport messages
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame was not valid JSON or did not match any known message
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Binary frames are not part of the protocol
    #[error("Binary frames are not supported")]
    UnexpectedBinary,
}
