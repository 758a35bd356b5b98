//! Socket Layer
//!
//! `SecureSocket` owns one connection to one gateway endpoint and exposes
//! it as a byte stream:
//! - `connect()` starts the timed TCP + TLS handshake without blocking
//! - `send()` queues opaque bytes, in order, no framing
//! - `on_opened` / `on_data` / `on_closed` / `on_error` report progress
//!
//! Message framing, request correlation, heartbeats and reconnection are
//! left to the session layer sitting on top.

mod driver;
mod handler;
mod secure;
mod state;
mod stats;

pub use handler::{Callbacks, EventChannel, NoopHandler, TransportEvent, TransportHandler};
pub use secure::SecureSocket;
pub use state::ConnectionState;
pub use stats::StatsSnapshot;
