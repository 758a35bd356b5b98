//! gatelink - TLS socket transport for binary trading-gateway protocols
//!
//! # Architecture (Layered)
//!
//! ```text
//! Session / protocol component (framing, correlation, heartbeats)
//! → Socket (SecureSocket: connect / send / lifecycle notifications)
//! → Transport (Connector: TCP + TLS handshake)
//! ```
//!
//! ## Core Principles
//!
//! - The socket is a byte stream, not a message stream: `on_data` chunk
//!   boundaries mean nothing
//! - One instance, one endpoint, one connection, one terminal notification
//! - Connectors are traits, so the socket runs unchanged over an in-memory
//!   peer in tests
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── common/          # Core types: Endpoint, Stream
//! ├── transport/       # Connectors: TCP, TLS, in-memory, null
//! ├── socket/          # SecureSocket, state machine, handlers
//! └── config.rs        # JSON-loadable transport configuration
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use gatelink::{SecureSocket, TransportConfig, TransportEvent};
//!
//! # async fn run() -> gatelink::Result<()> {
//! let socket = SecureSocket::new(TransportConfig::new("gw.example", 443));
//! let mut events = socket.subscribe()?;
//! socket.connect()?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         TransportEvent::Opened => socket.send(vec![0x01u8, 0x02, 0x03]),
//!         TransportEvent::Data(chunk) => println!("{} bytes", chunk.len()),
//!         TransportEvent::Closed | TransportEvent::Error(_) => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod common;
pub mod error;

// Layered architecture
pub mod transport;
pub mod socket;

// Supporting modules
pub mod config;

// Re-exports for convenience
pub use common::{Endpoint, Stream};
pub use config::{TlsSettings, TransportConfig};
pub use error::{Error, Result};

// Architecture re-exports
pub use socket::{
    Callbacks, ConnectionState, EventChannel, SecureSocket, TransportEvent, TransportHandler,
};
pub use transport::{Connector, TlsConnector};
