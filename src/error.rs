//! Error types for respkv
//!
//! Provides a unified error type for decoding, dispatch and networking.

use std::io;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for respkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    /// Peer closed the stream at a frame boundary
    #[error("End of stream")]
    EndOfStream,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A read or write deadline elapsed
    #[error("Timed out waiting for peer")]
    Timeout,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed framing. The stream can no longer be trusted.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Well-formed frame carrying an invalid command
    #[error("{0}")]
    Command(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        KvError::Protocol(message.into())
    }

    pub(crate) fn command(message: impl Into<String>) -> Self {
        KvError::Command(message.into())
    }

    /// Map an I/O error from a socket read or write, folding timeouts into
    /// `Timeout` so callers do not have to match on platform-specific kinds.
    pub(crate) fn from_io(err: io::Error) -> Self {
        match err.kind() {
            // Unix reports socket timeouts as WouldBlock, Windows as TimedOut
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => KvError::Timeout,
            _ => KvError::Io(err),
        }
    }

    /// Whether the connection must be closed after this error
    pub fn is_connection_fatal(&self) -> bool {
        !matches!(self, KvError::Command(_))
    }

    /// Whether this error just means the peer went away
    pub fn is_disconnect(&self) -> bool {
        match self {
            KvError::EndOfStream => true,
            KvError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
