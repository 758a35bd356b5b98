//! Common types and abstractions
//!
//! - Endpoint: the immutable host/port a transport dials
//! - Stream: unified async I/O abstraction handed up by connectors
//! - Error: unified error types

mod endpoint;
mod stream;

pub use endpoint::Endpoint;
pub use stream::{AsyncReadWrite, Stream};

// Re-export error types from crate root
pub use crate::error::{Error, Result};
