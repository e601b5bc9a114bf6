//! Connection establishment stages.
//!
//! Each stage is one awaitable step of the chain driven by the client task:
//!
//! 1. [`resolve`] - look up `(host, port)` and keep the first address
//! 2. [`connect`] - open a TCP stream to that single address
//! 3. [`upgrade`] - perform the HTTP/1.1 WebSocket upgrade over the stream
//!
//! Only the first resolved address is tried. A refused connect is reported,
//! not retried against the remaining candidates.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;

use tokio::net::{TcpStream, lookup_host};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::client_async_with_config;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::{debug, trace, warn};

use crate::client::ClientConfig;
use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// WebSocket stream over plain TCP.
pub(crate) type ClientStream = WebSocketStream<TcpStream>;

// ============================================================================
// Stages
// ============================================================================

/// Resolves `(host, port)` and returns the first candidate.
///
/// # Errors
///
/// - [`Error::Resolve`] if the lookup fails
/// - [`Error::NoAddresses`] if it yields nothing
pub(crate) async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|e| Error::resolve(host, port, e))?;

    let addr = addrs.next().ok_or_else(|| Error::no_addresses(host, port))?;
    let remaining = addrs.count();

    debug!(%addr, remaining, "Resolved host");
    Ok(addr)
}

/// Opens a TCP connection to `addr`.
///
/// # Errors
///
/// Returns [`Error::Connect`] if the connection cannot be established.
pub(crate) async fn connect(addr: SocketAddr, nodelay: bool) -> Result<TcpStream> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::connect(addr, e))?;

    if nodelay && let Err(e) = stream.set_nodelay(true) {
        warn!(error = %e, "Failed to enable TCP_NODELAY");
    }

    debug!(%addr, "TCP connection established");
    Ok(stream)
}

/// Upgrades `stream` to a WebSocket session.
///
/// The request target and `Host` header come from `config`.
///
/// # Errors
///
/// Returns [`Error::Handshake`] if the request cannot be built or the server
/// refuses the upgrade.
pub(crate) async fn upgrade(stream: TcpStream, config: &ClientConfig) -> Result<ClientStream> {
    let request = config
        .request_uri()
        .into_client_request()
        .map_err(Error::handshake)?;

    trace!(uri = %request.uri(), "Sending upgrade request");

    let (ws_stream, response) =
        client_async_with_config(request, stream, Some(config.websocket_config()))
            .await
            .map_err(Error::handshake)?;

    debug!(status = %response.status(), "WebSocket upgrade accepted");
    Ok(ws_stream)
}

// ============================================================================
// Tests
// ============================================================================
