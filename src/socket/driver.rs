//! Connection driver
//!
//! One driver future per `connect()`. It owns the stream and the handler,
//! performs the timed handshake, then runs the outbound queue and inbound
//! reads side by side until the connection ends. Every notification
//! is issued from here, in order, and exactly one terminal notification
//! ends the run.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::common::{Endpoint, Result, Stream};
use crate::error::Error;
use crate::transport::Connector;

use super::handler::TransportHandler;
use super::state::{ConnectionState, StateCell};
use super::stats::TransportStats;

/// Requests from the socket to its driver
#[derive(Debug)]
pub(crate) enum Command {
    Write(Bytes),
    Close,
}

/// How the pump loop ended without error
enum Shutdown {
    RemoteEof,
    LocalClose,
    SocketDropped,
}

pub(crate) struct Driver {
    pub(crate) endpoint: Endpoint,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) connect_timeout: Duration,
    pub(crate) read_buffer_size: usize,
    pub(crate) state: Arc<StateCell>,
    pub(crate) stats: Arc<TransportStats>,
    pub(crate) handler: Box<dyn TransportHandler>,
    pub(crate) commands: mpsc::UnboundedReceiver<Command>,
}

impl Driver {
    pub(crate) async fn run(mut self) {
        debug!(
            "Connecting to {} via {} (timeout {:?})",
            self.endpoint,
            self.connector.name(),
            self.connect_timeout
        );

        let connected = {
            let connecting = self.connector.connect(&self.endpoint);
            tokio::time::timeout(self.connect_timeout, connecting).await
        };
        let stream = match connected {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return self.fail(e),
            Err(_) => {
                let timeout = self.connect_timeout;
                return self.fail(Error::Timeout(timeout));
            }
        };

        self.state.advance(ConnectionState::Open);
        info!("Connection to {} open", self.endpoint);
        self.handler.on_opened();

        let outcome = self.pump(stream).await;
        match outcome {
            Ok(reason) => {
                match reason {
                    Shutdown::RemoteEof => info!("Connection to {} closed by peer", self.endpoint),
                    Shutdown::LocalClose => info!("Connection to {} closed locally", self.endpoint),
                    Shutdown::SocketDropped => {
                        debug!("Socket for {} dropped, connection closed", self.endpoint)
                    }
                }
                self.state.advance(ConnectionState::Closed);
                self.handler.on_closed();
            }
            Err(e) => self.fail(e),
        }
    }

    async fn pump(&mut self, stream: Stream) -> Result<Shutdown> {
        let (mut reader, mut writer) = tokio::io::split(stream);
        let mut buf = vec![0u8; self.read_buffer_size];

        let endpoint = &self.endpoint;
        let stats = &self.stats;
        let commands = &mut self.commands;
        let handler = &mut self.handler;

        // The two halves progress independently: a write stuck on a full
        // peer buffer must not stop inbound data from being drained.
        let outbound = async {
            while let Some(command) = commands.recv().await {
                match command {
                    Command::Write(data) => {
                        writer.write_all(&data).await?;
                        writer.flush().await?;
                        stats.record_sent(data.len());
                        trace!("Sent {} bytes to {}", data.len(), endpoint);
                    }
                    Command::Close => {
                        if let Err(e) = writer.shutdown().await {
                            debug!("Shutdown of {} failed: {}", endpoint, e);
                        }
                        return Ok(Shutdown::LocalClose);
                    }
                }
            }
            let _ = writer.shutdown().await;
            Ok::<_, Error>(Shutdown::SocketDropped)
        };

        let inbound = async {
            loop {
                let n = match reader.read(&mut buf).await {
                    Ok(0) => return Ok::<_, Error>(Shutdown::RemoteEof),
                    Ok(n) => n,
                    // FIN without close_notify still ends the stream cleanly
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                        debug!("{} closed the connection without close_notify", endpoint);
                        return Ok(Shutdown::RemoteEof);
                    }
                    Err(e) => return Err(e.into()),
                };
                stats.record_received(n);
                trace!("Received {} bytes from {}", n, endpoint);
                handler.on_data(Bytes::copy_from_slice(&buf[..n]));
            }
        };

        tokio::pin!(outbound, inbound);
        tokio::select! {
            // Local close wins over data that is already in flight
            biased;

            shutdown = &mut outbound => shutdown,
            shutdown = &mut inbound => shutdown,
        }
    }

    fn fail(mut self, error: Error) {
        warn!("Connection to {} failed: {}", self.endpoint, error);
        self.state.advance(ConnectionState::Failed);
        self.handler.on_error(&error);
    }
}
