//! SecureSocket - one TLS connection to one gateway endpoint

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::trace;

use crate::common::Endpoint;
use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::transport::{Connector, TlsConnector};

use super::driver::{Command, Driver};
use super::handler::{EventChannel, NoopHandler, TransportEvent, TransportHandler};
use super::state::{ConnectionState, StateCell};
use super::stats::{StatsSnapshot, TransportStats};

/// Byte-stream transport over a single secure connection
///
/// The endpoint is fixed at construction and nothing touches the network
/// until [`connect`](Self::connect). Outcomes are reported through the
/// registered [`TransportHandler`]: `on_opened` once the handshake is done,
/// `on_data` per inbound chunk, then exactly one of `on_closed` or
/// `on_error`. An instance connects at most once; reconnecting means
/// building a new one.
pub struct SecureSocket {
    endpoint: Endpoint,
    config: TransportConfig,
    connector: Arc<dyn Connector>,
    state: Arc<StateCell>,
    stats: Arc<TransportStats>,
    /// Registered handler, moved into the driver on connect
    handler: Mutex<Option<Box<dyn TransportHandler>>>,
    /// Outbound queue; present from connect until close
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
}

impl SecureSocket {
    /// Socket dialling `config.host:config.port` over TLS
    pub fn new(config: TransportConfig) -> Self {
        let connector = Arc::new(TlsConnector::new(config.tls.clone()));
        Self::with_connector(config, connector)
    }

    /// Socket using an arbitrary connector underneath
    pub fn with_connector(config: TransportConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            endpoint: config.endpoint(),
            config,
            connector,
            state: Arc::new(StateCell::new()),
            stats: Arc::new(TransportStats::default()),
            handler: Mutex::new(None),
            commands: Mutex::new(None),
        }
    }

    pub fn host(&self) -> &str {
        self.endpoint.host()
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Register the handler for this socket's notifications.
    ///
    /// Only possible before `connect`; replaces any earlier handler.
    pub fn set_handler(&self, handler: impl TransportHandler) -> Result<()> {
        let state = self.state.get();
        if state != ConnectionState::Idle {
            return Err(Error::InvalidState(state));
        }
        *self.handler.lock() = Some(Box::new(handler));
        Ok(())
    }

    /// Register an [`EventChannel`] and return its receiving end
    pub fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>> {
        let (handler, rx) = EventChannel::pair();
        self.set_handler(handler)?;
        Ok(rx)
    }

    /// Start connecting on the current tokio runtime and return immediately.
    ///
    /// Handshake success or failure arrives through the handler. Fails
    /// synchronously only when the socket is not idle (a connection is in
    /// flight, open, or finished) or when called outside a runtime; in both
    /// cases nothing changes and no notification fires.
    pub fn connect(&self) -> Result<()> {
        let runtime = Handle::try_current().map_err(|_| Error::Runtime)?;
        self.state.begin_connect().map_err(Error::InvalidState)?;

        let (tx, rx) = mpsc::unbounded_channel();
        *self.commands.lock() = Some(tx);

        let handler = self
            .handler
            .lock()
            .take()
            .unwrap_or_else(|| Box::new(NoopHandler));

        let driver = Driver {
            endpoint: self.endpoint.clone(),
            connector: Arc::clone(&self.connector),
            connect_timeout: self.config.connect_timeout(),
            read_buffer_size: self.config.read_buffer_size.max(1),
            state: Arc::clone(&self.state),
            stats: Arc::clone(&self.stats),
            handler,
            commands: rx,
        };
        runtime.spawn(driver.run());
        Ok(())
    }

    /// Queue bytes for transmission, verbatim and in call order.
    ///
    /// Without an open connection (not yet connected, still handshaking,
    /// closing, or finished) this is a no-op: the bytes are dropped and
    /// nothing is reported. Use [`try_send`](Self::try_send) to find out.
    pub fn send(&self, data: impl Into<Bytes>) {
        if let Err(e) = self.try_send(data) {
            trace!("Dropping write to {}: {}", self.endpoint, e);
        }
    }

    /// Like [`send`](Self::send), but reports `NotConnected` instead of
    /// dropping silently
    pub fn try_send(&self, data: impl Into<Bytes>) -> Result<()> {
        if !self.state.get().is_open() {
            return Err(Error::NotConnected);
        }

        let commands = self.commands.lock();
        let tx = commands.as_ref().ok_or(Error::NotConnected)?;

        let data = data.into();
        if data.is_empty() {
            return Ok(());
        }
        tx.send(Command::Write(data))
            .map_err(|_| Error::NotConnected)
    }

    /// Flush queued writes, shut the connection down, then fire `on_closed`.
    ///
    /// No-op unless the connection is open. Dropping an open socket has the
    /// same effect.
    pub fn close(&self) {
        if !self.state.get().is_open() {
            return;
        }
        if let Some(tx) = self.commands.lock().take() {
            let _ = tx.send(Command::Close);
        }
    }
}

impl fmt::Debug for SecureSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureSocket")
            .field("endpoint", &self.endpoint)
            .field("connector", &self.connector.name())
            .field("state", &self.state.get())
            .finish()
    }
}
