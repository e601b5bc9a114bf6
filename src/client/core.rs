//! The client handle.
//!
//! # Example
//!
//! ```no_run
//! use tokio::runtime::Handle;
//! use ws_lifecycle_client::{Client, ClientConfig, Handlers};
//!
//! # async fn example() -> ws_lifecycle_client::Result<()> {
//! let config = ClientConfig::from_url("ws://ws.ifelse.io/")?;
//! let client = Client::new(config, &Handle::current());
//!
//! // Callbacks hold a weak handle so they do not keep the session alive.
//! let sender = client.downgrade();
//! client.connect(
//!     Handlers::new()
//!         .on_connect(move |result| {
//!             if let (Ok(()), Some(client)) = (result, sender.upgrade()) {
//!                 client.send("hello", |_| {});
//!             }
//!         })
//!         .on_message(|text| println!("received: {text}")),
//! );
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::ClientId;
use crate::transport::ConnectionState;
use crate::transport::connection::{Command, Shared, Strand};

use super::handlers::Handlers;
use super::options::ClientConfig;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a client.
pub(crate) struct ClientInner {
    /// Unique identifier, also recorded on the task's span.
    id: ClientId,
    /// Target and limits.
    config: Arc<ClientConfig>,
    /// State shared with the task.
    shared: Arc<Shared>,
    /// Command queue into the task. Dropping the last sender ends the task.
    command_tx: mpsc::UnboundedSender<Command>,
}

// ============================================================================
// Client
// ============================================================================

/// A single-use WebSocket client.
///
/// Each client drives one connection attempt and at most one session. Every
/// operation returns immediately; its outcome is delivered to a callback on
/// the client's task. Callbacks of one client never run concurrently and
/// never run inside the call that scheduled them.
///
/// Cloning is cheap and yields another handle to the same connection.
/// Dropping every `Client` handle cancels any pending stage or read.
///
/// The client's task owns the callbacks, so a `Client` captured by a
/// callback keeps the session alive until it ends on its own. Capture a
/// [`WeakClient`] from [`downgrade`](Self::downgrade) instead.
#[derive(Clone)]
pub struct Client {
    /// Shared inner state.
    pub(crate) inner: Arc<ClientInner>,
}

// ============================================================================
// Client - Display
// ============================================================================

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.inner.id)
            .field("uri", &self.inner.config.request_uri())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Constructor
// ============================================================================

impl Client {
    /// Creates an idle client whose task runs on `runtime`.
    ///
    /// No I/O happens until [`connect`](Self::connect).
    #[must_use]
    pub fn new(config: ClientConfig, runtime: &Handle) -> Self {
        let id = ClientId::generate();
        let config = Arc::new(config);
        let shared = Arc::new(Shared::new());
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Strand::spawn(
            id,
            Arc::clone(&config),
            Arc::clone(&shared),
            command_rx,
            runtime,
        );

        debug!(%id, uri = %config.request_uri(), "Client created");

        Self {
            inner: Arc::new(ClientInner {
                id,
                config,
                shared,
                command_tx,
            }),
        }
    }
}

// ============================================================================
// Client - Accessors
// ============================================================================

impl Client {
    /// Returns the client's identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.inner.id
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.state()
    }

    /// Returns a receiver that observes every state change.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.shared.subscribe()
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[inline]
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.inner.shared.is_closing()
    }
}

// ============================================================================
// Client - Operations
// ============================================================================

impl Client {
    /// Starts resolve, TCP connect and the WebSocket upgrade.
    ///
    /// `on_connect` receives the outcome exactly once. After a successful
    /// connect, `on_message` receives every text message in arrival order
    /// and `on_disconnect` receives the session outcome at most once.
    ///
    /// A second call reports [`Error::NotIdle`](crate::Error::NotIdle) to its
    /// own `on_connect` and leaves the connection untouched.
    pub fn connect(&self, handlers: Handlers) {
        trace!(id = %self.inner.id, "Connect requested");
        self.dispatch(Command::Connect(handlers));
    }

    /// Queues one text message.
    ///
    /// Sends are written one at a time, in call order. `on_send` receives the
    /// write outcome, or [`Error::NotOpen`](crate::Error::NotOpen) if the
    /// session is not open when the send is processed.
    ///
    /// A write is awaited to completion before the next read or command is
    /// taken. There is no write timeout: a peer that stops reading stalls
    /// the session until the transport gives up.
    pub fn send<F>(&self, message: impl Into<String>, on_send: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.dispatch(Command::Send {
            message: message.into(),
            on_send: Box::new(on_send),
        });
    }

    /// Begins teardown.
    ///
    /// While open, the pending read is cancelled and a Normal (1000) close
    /// frame is sent; `on_disconnect` later receives the close outcome.
    /// During resolve/connect/handshake the stage is cancelled and
    /// `on_connect` receives [`Error::Cancelled`](crate::Error::Cancelled).
    ///
    /// `on_close` runs once the request has been processed. Repeated calls
    /// are harmless.
    ///
    /// Commands are processed in order, so a close queued behind a stalled
    /// [`send`](Self::send) takes effect only after that write completes.
    pub fn close<F>(&self, on_close: F)
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.inner.shared.mark_closing();
        self.dispatch(Command::Close {
            on_close: Box::new(on_close),
        });
    }

    /// Returns a handle that does not keep the client alive.
    ///
    /// Use it in callbacks that need to call back into the client.
    #[must_use]
    pub fn downgrade(&self) -> WeakClient {
        WeakClient {
            id: self.inner.id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Hands a command to the task, or rejects it if the task is gone.
    fn dispatch(&self, command: Command) {
        if let Err(mpsc::error::SendError(command)) = self.inner.command_tx.send(command) {
            debug!(id = %self.inner.id, "Client task is gone; rejecting command");
            command.reject(self.state());
        }
    }
}

// ============================================================================
// WeakClient
// ============================================================================

/// A non-owning handle to a [`Client`].
///
/// Obtained from [`Client::downgrade`]. Once every `Client` handle is
/// dropped, [`upgrade`](Self::upgrade) returns `None` and the session is
/// cancelled.
#[derive(Clone)]
pub struct WeakClient {
    id: ClientId,
    inner: Weak<ClientInner>,
}

impl fmt::Debug for WeakClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakClient")
            .field("id", &self.id)
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl WeakClient {
    /// Returns the identifier of the client this handle points to.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Returns a strong handle if any `Client` handle is still alive.
    ///
    /// Drop the returned handle before the callback returns.
    #[inline]
    #[must_use]
    pub fn upgrade(&self) -> Option<Client> {
        self.inner.upgrade().map(|inner| Client { inner })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::sync::oneshot;
    use tokio::time::timeout;

    use crate::error::Error;

    fn unreachable_config() -> ClientConfig {
        ClientConfig::builder()
            .host("no-such-host.invalid")
            .port(80)
            .build()
            .expect("valid config")
    }

    #[tokio::test]
    async fn test_new_client_is_idle() {
        let client = Client::new(unreachable_config(), &Handle::current());
        assert_eq!(client.state(), ConnectionState::Idle);
        assert!(!client.is_closing());
        assert_eq!(client.config().host(), "no-such-host.invalid");
    }

    #[tokio::test]
    async fn test_clones_share_identity() {
        let client = Client::new(unreachable_config(), &Handle::current());
        let other = client.clone();
        assert_eq!(client.id(), other.id());
        assert_ne!(client.id(), Client::new(unreachable_config(), &Handle::current()).id());
    }

    #[tokio::test]
    async fn test_weak_handle_does_not_keep_client_alive() {
        let client = Client::new(unreachable_config(), &Handle::current());
        let weak = client.downgrade();
        assert_eq!(weak.id(), client.id());

        let upgraded = weak.upgrade().expect("client alive");
        assert_eq!(upgraded.id(), client.id());
        drop(upgraded);

        drop(client);
        assert!(weak.upgrade().is_none());
        assert!(format!("{weak:?}").contains("alive: false"));
    }

    #[tokio::test]
    async fn test_debug_shows_id_and_uri() {
        let client = Client::new(unreachable_config(), &Handle::current());
        let debug = format!("{client:?}");
        assert!(debug.contains("Client"));
        assert!(debug.contains("ws://no-such-host.invalid:80/"));
    }

    #[tokio::test]
    async fn test_send_while_idle_is_rejected() {
        let client = Client::new(unreachable_config(), &Handle::current());
        let (tx, rx) = oneshot::channel();
        client.send("early", move |result| {
            let _ = tx.send(result);
        });

        let result = timeout(Duration::from_secs(5), rx)
            .await
            .expect("send completion delivered")
            .expect("callback ran");
        assert!(matches!(
            result,
            Err(Error::NotOpen {
                state: ConnectionState::Idle
            })
        ));
    }

    #[tokio::test]
    async fn test_close_while_idle_completes() {
        let client = Client::new(unreachable_config(), &Handle::current());
        let (tx, rx) = oneshot::channel();
        client.close(move |result| {
            let _ = tx.send(result);
        });
        assert!(client.is_closing());

        let result = timeout(Duration::from_secs(5), rx)
            .await
            .expect("close completion delivered")
            .expect("callback ran");
        assert!(result.is_ok());
        assert_eq!(client.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_never_runs_inline() {
        let client = Client::new(unreachable_config(), &Handle::current());
        let (tx, rx) = oneshot::channel();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        client.close(move |_| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
            let _ = tx.send(());
        });
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));

        timeout(Duration::from_secs(5), rx)
            .await
            .expect("close completion delivered")
            .expect("callback ran");
    }
}
