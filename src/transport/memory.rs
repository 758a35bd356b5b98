//! In-memory connector
//!
//! Each connect creates a `tokio::io::duplex` pipe: the client half goes to
//! the socket layer, the other half is delivered to a `MemoryListener`
//! standing in for the gateway.

use async_trait::async_trait;
use tokio::io::DuplexStream;
use tokio::sync::mpsc;
use tracing::trace;

use crate::common::{Endpoint, Result, Stream};
use crate::error::Error;

use super::Connector;

/// Default pipe capacity in bytes
const DEFAULT_CAPACITY: usize = 64 * 1024;

/// Create a connected connector/listener pair
pub fn memory_pair(capacity: usize) -> (MemoryConnector, MemoryListener) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        MemoryConnector { tx, capacity },
        MemoryListener { rx },
    )
}

/// Client side of the in-memory pair
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    tx: mpsc::UnboundedSender<(DuplexStream, Endpoint)>,
    capacity: usize,
}

impl MemoryConnector {
    /// Pair with the default pipe capacity
    pub fn pair() -> (Self, MemoryListener) {
        memory_pair(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Stream> {
        endpoint.validate()?;

        let (client, server) = tokio::io::duplex(self.capacity);
        self.tx
            .send((server, endpoint.clone()))
            .map_err(|_| Error::Io(std::io::ErrorKind::ConnectionRefused.into()))?;

        trace!("Memory: connected to {}", endpoint);
        Ok(Box::new(client))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Peer side of the in-memory pair
#[derive(Debug)]
pub struct MemoryListener {
    rx: mpsc::UnboundedReceiver<(DuplexStream, Endpoint)>,
}

impl MemoryListener {
    /// Wait for the next connection, along with the endpoint it dialled.
    /// Returns `None` once every connector is gone.
    pub async fn accept(&mut self) -> Option<(DuplexStream, Endpoint)> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_memory_pair_carries_bytes_both_ways() {
        let (connector, mut listener) = memory_pair(1024);
        let mut client = connector
            .connect(&Endpoint::new("gw.example", 443))
            .await
            .unwrap();
        let (mut server, endpoint) = listener.accept().await.unwrap();
        assert_eq!(endpoint, Endpoint::new("gw.example", 443));

        client.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        server.write_all(b"world").await.unwrap();
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"world");
    }

    #[tokio::test]
    async fn test_connect_refused_without_listener() {
        let (connector, listener) = MemoryConnector::pair();
        drop(listener);

        let result = connector.connect(&Endpoint::new("gw.example", 443)).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
