//! Error types for the WebSocket client.
//!
//! Every asynchronous stage of the connection lifecycle reports its outcome
//! as a [`Result<T>`] delivered to exactly one callback. The variants of
//! [`Error`] name the stage that failed; [`Error::kind`] folds them into the
//! coarse [`ErrorKind`] taxonomy.
//!
//! # Error Categories
//!
//! | Kind | Variants |
//! |------|----------|
//! | [`ErrorKind::ResolutionFailed`] | [`Error::Resolve`], [`Error::NoAddresses`] |
//! | [`ErrorKind::ConnectFailed`] | [`Error::Connect`] |
//! | [`ErrorKind::HandshakeFailed`] | [`Error::Handshake`] |
//! | [`ErrorKind::ReadFailed`] | [`Error::Read`], [`Error::ClosedByPeer`], [`Error::Cancelled`] |
//! | [`ErrorKind::WriteFailed`] | [`Error::Write`] |
//! | [`ErrorKind::CloseFailed`] | [`Error::Close`] |
//! | [`ErrorKind::CallerMisuse`] | [`Error::NotIdle`], [`Error::NotOpen`] |
//! | [`ErrorKind::Config`] | [`Error::Config`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::net::SocketAddr;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorKind
// ============================================================================

/// Coarse classification of an [`enum@Error`] by lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Host name resolution failed.
    ResolutionFailed,
    /// TCP connect failed.
    ConnectFailed,
    /// WebSocket upgrade failed.
    HandshakeFailed,
    /// The receive loop stopped (including cancellation).
    ReadFailed,
    /// A text frame could not be written.
    WriteFailed,
    /// The close handshake failed.
    CloseFailed,
    /// An operation was issued in a state that does not accept it.
    CallerMisuse,
    /// Invalid client configuration.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolutionFailed => "resolution failed",
            Self::ConnectFailed => "connect failed",
            Self::HandshakeFailed => "handshake failed",
            Self::ReadFailed => "read failed",
            Self::WriteFailed => "write failed",
            Self::CloseFailed => "close failed",
            Self::CallerMisuse => "caller misuse",
            Self::Config => "configuration error",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned synchronously by [`ClientBuilder::build`](crate::ClientBuilder::build)
    /// and [`ClientConfig::from_url`](crate::ClientConfig::from_url).
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Establishment Errors
    // ========================================================================
    /// Address lookup failed.
    #[error("Failed to resolve {host}:{port}: {source}")]
    Resolve {
        /// Host that was looked up.
        host: String,
        /// Port that was looked up.
        port: u16,
        /// Underlying resolver error.
        #[source]
        source: IoError,
    },

    /// Address lookup succeeded but returned no candidates.
    #[error("No addresses found for {host}:{port}")]
    NoAddresses {
        /// Host that was looked up.
        host: String,
        /// Port that was looked up.
        port: u16,
    },

    /// TCP connect to the resolved address failed.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// The single candidate address.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: IoError,
    },

    /// WebSocket upgrade handshake failed.
    #[error("WebSocket handshake failed: {source}")]
    Handshake {
        /// Underlying protocol error.
        #[source]
        source: WsError,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// The receive loop stopped on a transport or protocol error.
    #[error("Read failed: {message}")]
    Read {
        /// Description of the failure.
        message: String,
        /// Underlying protocol error, if any.
        #[source]
        source: Option<WsError>,
    },

    /// The server sent a close frame.
    #[error("Connection closed by peer (code {code}): {reason}")]
    ClosedByPeer {
        /// Close code from the peer's frame (1005 if none was given).
        code: u16,
        /// Close reason from the peer's frame.
        reason: String,
    },

    /// The pending operation was cancelled by teardown.
    #[error("Operation cancelled")]
    Cancelled,

    /// A text frame could not be written.
    #[error("Write failed: {source}")]
    Write {
        /// Underlying protocol error.
        #[source]
        source: WsError,
    },

    /// The close handshake failed.
    #[error("Close failed: {source}")]
    Close {
        /// Underlying protocol error.
        #[source]
        source: WsError,
    },

    // ========================================================================
    // Caller Misuse
    // ========================================================================
    /// `connect` was called on a client that is not idle.
    #[error("Client is not idle (state: {state})")]
    NotIdle {
        /// State at the time the call was processed.
        state: ConnectionState,
    },

    /// `send` was called on a client that is not open.
    #[error("Client is not open (state: {state})")]
    NotOpen {
        /// State at the time the call was processed.
        state: ConnectionState,
    },
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a resolution error.
    #[inline]
    pub fn resolve(host: impl Into<String>, port: u16, source: IoError) -> Self {
        Self::Resolve {
            host: host.into(),
            port,
            source,
        }
    }

    /// Creates an empty-resolution error.
    #[inline]
    pub fn no_addresses(host: impl Into<String>, port: u16) -> Self {
        Self::NoAddresses {
            host: host.into(),
            port,
        }
    }

    /// Creates a TCP connect error.
    #[inline]
    pub fn connect(addr: SocketAddr, source: IoError) -> Self {
        Self::Connect { addr, source }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(source: WsError) -> Self {
        Self::Handshake { source }
    }

    /// Creates a read error wrapping a protocol error.
    #[inline]
    pub fn read(source: WsError) -> Self {
        Self::Read {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a read error for a stream that ended without a close frame.
    #[inline]
    pub fn stream_ended() -> Self {
        Self::Read {
            message: "stream ended without a close frame".to_string(),
            source: None,
        }
    }

    /// Creates a peer-close error.
    #[inline]
    pub fn closed_by_peer(code: u16, reason: impl Into<String>) -> Self {
        Self::ClosedByPeer {
            code,
            reason: reason.into(),
        }
    }

    /// Creates a write error.
    #[inline]
    pub fn write(source: WsError) -> Self {
        Self::Write { source }
    }

    /// Creates a close error.
    #[inline]
    pub fn close(source: WsError) -> Self {
        Self::Close { source }
    }

    /// Creates a not-idle misuse error.
    #[inline]
    pub fn not_idle(state: ConnectionState) -> Self {
        Self::NotIdle { state }
    }

    /// Creates a not-open misuse error.
    #[inline]
    pub fn not_open(state: ConnectionState) -> Self {
        Self::NotOpen { state }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the lifecycle stage this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config { .. } => ErrorKind::Config,
            Self::Resolve { .. } | Self::NoAddresses { .. } => ErrorKind::ResolutionFailed,
            Self::Connect { .. } => ErrorKind::ConnectFailed,
            Self::Handshake { .. } => ErrorKind::HandshakeFailed,
            Self::Read { .. } | Self::ClosedByPeer { .. } | Self::Cancelled => {
                ErrorKind::ReadFailed
            }
            Self::Write { .. } => ErrorKind::WriteFailed,
            Self::Close { .. } => ErrorKind::CloseFailed,
            Self::NotIdle { .. } | Self::NotOpen { .. } => ErrorKind::CallerMisuse,
        }
    }

    /// Returns `true` if the operation was cancelled by teardown.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the error reports an operation issued in the wrong state.
    #[inline]
    #[must_use]
    pub fn is_caller_misuse(&self) -> bool {
        self.kind() == ErrorKind::CallerMisuse
    }

    /// Returns `true` if the connection could not be established.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ResolutionFailed | ErrorKind::ConnectFailed | ErrorKind::HandshakeFailed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
