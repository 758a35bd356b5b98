//! Null Connectors - Blackhole and Reject
//!
//! Connectors that never produce a working stream, used to exercise the
//! failure paths of the socket layer:
//! - **BlackholeConnector**: never completes, so only the connect timeout ends it
//! - **RejectConnector**: immediately fails as if the peer refused the connection

use std::io::{self, ErrorKind};

use async_trait::async_trait;

use crate::common::{Endpoint, Result, Stream};
use crate::error::Error;

use super::Connector;

// ============================================================================
// BlackholeConnector
// ============================================================================

/// Blackhole connector - the handshake never finishes
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackholeConnector;

impl BlackholeConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for BlackholeConnector {
    async fn connect(&self, _endpoint: &Endpoint) -> Result<Stream> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "blackhole"
    }
}

// ============================================================================
// RejectConnector
// ============================================================================

/// Reject connector - immediately fails on connect
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectConnector;

impl RejectConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for RejectConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Stream> {
        Err(Error::Io(io::Error::new(
            ErrorKind::ConnectionRefused,
            format!("connection to {} rejected", endpoint),
        )))
    }

    fn name(&self) -> &'static str {
        "reject"
    }
}
