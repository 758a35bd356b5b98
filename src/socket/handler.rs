//! Lifecycle notifications
//!
//! A socket reports to exactly one registered handler. Three ways to supply
//! one:
//! - implement `TransportHandler` directly
//! - `Callbacks`, four optional closure slots
//! - `EventChannel`, which turns notifications into `TransportEvent`s on an
//!   mpsc channel
//!
//! All notifications for one connection are delivered sequentially from its
//! driver, never concurrently.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::Error;

/// Receiver of socket lifecycle notifications. Every method defaults to a
/// no-op.
pub trait TransportHandler: Send + 'static {
    /// The TLS handshake completed. Fires at most once, before any data.
    fn on_opened(&mut self) {}

    /// A chunk arrived. Chunk boundaries carry no meaning; reassemble
    /// messages from the concatenation of chunks.
    fn on_data(&mut self, _chunk: Bytes) {}

    /// The stream ended cleanly. Terminal.
    fn on_closed(&mut self) {}

    /// The connection failed. Terminal, and never followed by `on_closed`.
    fn on_error(&mut self, _error: &Error) {}
}

/// Handler that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl TransportHandler for NoopHandler {}

type OpenedFn = Box<dyn FnMut() + Send>;
type DataFn = Box<dyn FnMut(Bytes) + Send>;
type ClosedFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(&Error) + Send>;

/// Closure-based handler with one optional slot per notification
#[derive(Default)]
pub struct Callbacks {
    opened: Option<OpenedFn>,
    data: Option<DataFn>,
    closed: Option<ClosedFn>,
    error: Option<ErrorFn>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.opened = Some(Box::new(f));
        self
    }

    pub fn data(mut self, f: impl FnMut(Bytes) + Send + 'static) -> Self {
        self.data = Some(Box::new(f));
        self
    }

    pub fn closed(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.closed = Some(Box::new(f));
        self
    }

    pub fn error(mut self, f: impl FnMut(&Error) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("opened", &self.opened.is_some())
            .field("data", &self.data.is_some())
            .field("closed", &self.closed.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl TransportHandler for Callbacks {
    fn on_opened(&mut self) {
        if let Some(f) = self.opened.as_mut() {
            f();
        }
    }

    fn on_data(&mut self, chunk: Bytes) {
        if let Some(f) = self.data.as_mut() {
            f(chunk);
        }
    }

    fn on_closed(&mut self) {
        if let Some(f) = self.closed.as_mut() {
            f();
        }
    }

    fn on_error(&mut self, error: &Error) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }
}

/// A lifecycle notification as a value
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Opened,
    Data(Bytes),
    Closed,
    Error(Arc<Error>),
}

/// Handler forwarding every notification into an unbounded channel
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl EventChannel {
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: TransportEvent) {
        // Receiver gone means nobody is listening any more
        let _ = self.tx.send(event);
    }
}

impl TransportHandler for EventChannel {
    fn on_opened(&mut self) {
        self.emit(TransportEvent::Opened);
    }

    fn on_data(&mut self, chunk: Bytes) {
        self.emit(TransportEvent::Data(chunk));
    }

    fn on_closed(&mut self) {
        self.emit(TransportEvent::Closed);
    }

    fn on_error(&mut self, error: &Error) {
        // Errors are not Clone; rebuild an equivalent owned value
        self.emit(TransportEvent::Error(Arc::new(owned_error(error))));
    }
}

fn owned_error(error: &Error) -> Error {
    match error {
        Error::Io(e) => Error::Io(std::io::Error::new(e.kind(), e.to_string())),
        Error::Config(msg) => Error::Config(msg.clone()),
        Error::Tls(msg) => Error::Tls(msg.clone()),
        Error::InvalidAddress(msg) => Error::InvalidAddress(msg.clone()),
        Error::Timeout(after) => Error::Timeout(*after),
        Error::InvalidState(state) => Error::InvalidState(*state),
        Error::NotConnected => Error::NotConnected,
        Error::Runtime => Error::Runtime,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_default_methods_are_noops() {
        let mut handler = NoopHandler;
        handler.on_opened();
        handler.on_data(Bytes::from_static(b"x"));
        handler.on_error(&Error::NotConnected);
        handler.on_closed();
    }

    #[test]
    fn test_callbacks_fill_only_set_slots() {
        let opened = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(AtomicUsize::new(0));

        let mut callbacks = Callbacks::new()
            .opened({
                let opened = Arc::clone(&opened);
                move || {
                    opened.fetch_add(1, Ordering::SeqCst);
                }
            })
            .data({
                let received = Arc::clone(&received);
                move |chunk| {
                    received.fetch_add(chunk.len(), Ordering::SeqCst);
                }
            });

        callbacks.on_opened();
        callbacks.on_data(Bytes::from_static(b"abc"));
        callbacks.on_closed();
        callbacks.on_error(&Error::NotConnected);

        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(received.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_event_channel_preserves_order() {
        let (mut handler, mut rx) = EventChannel::pair();
        handler.on_opened();
        handler.on_data(Bytes::from_static(b"\x01"));
        handler.on_error(&Error::Timeout(Duration::from_secs(1)));

        assert!(matches!(rx.recv().await, Some(TransportEvent::Opened)));
        assert!(matches!(rx.recv().await, Some(TransportEvent::Data(d)) if &d[..] == b"\x01"));
        match rx.recv().await {
            Some(TransportEvent::Error(e)) => assert!(matches!(*e, Error::Timeout(_))),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_channel_survives_dropped_receiver() {
        let (mut handler, rx) = EventChannel::pair();
        drop(rx);
        handler.on_data(Bytes::from_static(b"lost"));
        handler.on_closed();
    }

    #[test]
    fn test_owned_error_keeps_io_kind() {
        let original = Error::Io(std::io::ErrorKind::ConnectionReset.into());
        match owned_error(&original) {
            Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::ConnectionReset),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
