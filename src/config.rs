//! Configuration for a gateway transport
//!
//! Supports JSON configuration, e.g.
//!
//! ```json
//! {
//!   "host": "gw.example",
//!   "port": 443,
//!   "connect_timeout_ms": 5000,
//!   "tls": { "alpn": ["gw/1"], "ca_file": "/etc/gatelink/ca.pem" }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::common::Endpoint;
use crate::error::{Error, Result};

/// Default handshake budget (DNS + TCP + TLS)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default size of a single inbound read
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Gateway host, also used as the TLS server name
    pub host: String,

    /// Gateway port
    pub port: u16,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Upper bound on the size of one `data` chunk
    #[serde(default = "default_read_buffer_size")]
    pub read_buffer_size: usize,

    /// TLS settings
    #[serde(default)]
    pub tls: TlsSettings,
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
}

fn default_read_buffer_size() -> usize {
    DEFAULT_READ_BUFFER_SIZE
}

impl TransportConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout_ms: default_connect_timeout_ms(),
            read_buffer_size: default_read_buffer_size(),
            tls: TlsSettings::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rounds down to whole milliseconds, never below 1 ms
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        self
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size;
        self
    }

    pub fn with_tls(mut self, tls: TlsSettings) -> Self {
        self.tls = tls;
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Check the tunables.
    ///
    /// The endpoint itself is not checked here: a bad host or port is
    /// reported through the socket's error notification on connect.
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout_ms == 0 {
            return Err(Error::Config("connect_timeout_ms must be positive".into()));
        }
        if self.read_buffer_size == 0 {
            return Err(Error::Config("read_buffer_size must be positive".into()));
        }
        Ok(())
    }
}

/// TLS settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Skip certificate verification (test gateways only)
    #[serde(default)]
    pub allow_insecure: bool,

    /// ALPN protocols to offer
    #[serde(default)]
    pub alpn: Vec<String>,

    /// Extra PEM bundle trusted alongside the webpki roots
    #[serde(default)]
    pub ca_file: Option<String>,
}
