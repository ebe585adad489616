//! Error types for the protocol engine.

use thiserror::Error;

/// Errors raised by the connection and the run loop.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid admin mask: {0}")]
    AdminMask(#[from] regex::Error),

    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("not connected")]
    NotConnected,
}
