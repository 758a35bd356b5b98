//! Error types for gatelink

use std::time::Duration;

use thiserror::Error;

use crate::socket::ConnectionState;

/// Main error type for gatelink
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("Operation not allowed in state {0}")]
    InvalidState(ConnectionState),

    #[error("Not connected")]
    NotConnected,

    #[error("No async runtime available")]
    Runtime,
}

/// Result type alias for gatelink
pub type Result<T> = std::result::Result<T, Error>;
