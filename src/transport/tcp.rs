//! TCP Connector implementation

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::trace;

use crate::common::{Endpoint, Result, Stream};

use super::Connector;

/// TCP connector - raw TCP connections
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }

    /// Resolve and dial, returning the concrete socket
    pub async fn dial(&self, endpoint: &Endpoint) -> Result<TcpStream> {
        endpoint.validate()?;

        let stream = TcpStream::connect((endpoint.host(), endpoint.port())).await?;

        // Gateway traffic is small request/response frames
        stream.set_nodelay(true)?;

        trace!("TCP connected to {} via {}", endpoint, stream.peer_addr()?);
        Ok(stream)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Stream> {
        Ok(Box::new(self.dial(endpoint).await?))
    }

    fn name(&self) -> &'static str {
        "tcp"
    }
}
