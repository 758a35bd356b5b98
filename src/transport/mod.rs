//! Transport Layer
//!
//! Responsibilities:
//! - Turn an `Endpoint` into a connected, ready-to-use byte stream
//! - For TLS, the stream is only handed up once the handshake is complete
//! - NO framing, NO lifecycle bookkeeping, NO message parsing
//!
//! The socket layer drives a `Connector` and never touches sockets directly,
//! so any implementation here (real TLS, in-memory peer, failure doubles)
//! can sit underneath it.

mod memory;
mod null;
mod tcp;
mod tls;

pub use memory::{memory_pair, MemoryConnector, MemoryListener};
pub use null::{BlackholeConnector, RejectConnector};
pub use tcp::TcpConnector;
pub use tls::TlsConnector;

use async_trait::async_trait;

use crate::common::{Endpoint, Result, Stream};

/// Connector trait for establishing outbound connections
///
/// Implementations resolve, dial and (where applicable) complete any
/// handshake before returning. Timeouts are applied by the caller.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to a remote endpoint
    async fn connect(&self, endpoint: &Endpoint) -> Result<Stream>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
