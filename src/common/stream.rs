//! Stream abstraction
//!
//! Connectors hand the socket layer a boxed duplex byte stream. Whether it
//! is TLS over TCP or an in-memory pipe is invisible above this point.

use tokio::io::{AsyncRead, AsyncWrite};

/// The connection handle type produced by every connector.
pub type Stream = Box<dyn AsyncReadWrite + Unpin + Send>;

/// Combined trait for async read + write
pub trait AsyncReadWrite: AsyncRead + AsyncWrite {}

impl<T: AsyncRead + AsyncWrite> AsyncReadWrite for T {}
