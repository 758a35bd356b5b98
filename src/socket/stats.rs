//! Per-socket traffic counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the connection driver
#[derive(Debug, Default)]
pub(crate) struct TransportStats {
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    chunks_received: AtomicU64,
}

impl TransportStats {
    pub(crate) fn record_sent(&self, n: usize) {
        self.bytes_sent.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self, n: usize) {
        self.bytes_received.fetch_add(n as u64, Ordering::Relaxed);
        self.chunks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            chunks_received: self.chunks_received.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a socket's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Bytes written to the secure channel
    pub bytes_sent: u64,
    /// Bytes delivered through `on_data`
    pub bytes_received: u64,
    /// Number of `on_data` notifications
    pub chunks_received: u64,
}
