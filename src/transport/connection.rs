//! Client task and session event loop.
//!
//! Every [`Client`](crate::Client) owns one tokio task (its strand). Public
//! operations enqueue a [`Command`]; the task processes commands and socket
//! events one at a time, so callbacks of one client never run concurrently.
//!
//! # Task Lifecycle
//!
//! 1. Idle - wait for `Connect`
//! 2. Establish - resolve, connect, upgrade; each stage can be cancelled by `Close`
//! 3. Session - `select!` over the next inbound frame and the next command
//! 4. Teardown - send a Normal close frame, wait for the acknowledgement
//! 5. Drain - reject commands until every handle is dropped
//!
//! The disconnect callback fires exactly once for every path that ends an
//! open session. The `closing` flag suppresses the report from a cancelled
//! read when the close path already owns it.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::result::Result as StdResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{Error as WsError, Message, Utf8Bytes};
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::client::handlers::{CompletionHandler, ConnectHandler, SessionHandlers};
use crate::client::{ClientConfig, Handlers};
use crate::error::{Error, Result};
use crate::identifiers::ClientId;

use super::handshake::{self, ClientStream};
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

type WsSink = SplitSink<ClientStream, Message>;
type WsSource = SplitStream<ClientStream>;

// ============================================================================
// Command
// ============================================================================

/// Operations queued by the public API.
pub(crate) enum Command {
    /// Start the resolve/connect/handshake chain.
    Connect(Handlers),
    /// Write one text frame.
    Send {
        message: String,
        on_send: CompletionHandler,
    },
    /// Begin teardown.
    Close { on_close: CompletionHandler },
}

impl Command {
    /// Completes the command without touching the connection.
    ///
    /// Used for every command that arrives in a state that does not accept it.
    pub(crate) fn reject(self, state: ConnectionState) {
        match self {
            Self::Connect(handlers) => {
                warn!(%state, "Connect rejected: client is not idle");
                (handlers.on_connect)(Err(Error::not_idle(state)));
            }
            Self::Send { on_send, .. } => {
                debug!(%state, "Send rejected: client is not open");
                on_send(Err(Error::not_open(state)));
            }
            Self::Close { on_close } => {
                trace!(%state, "Close is a no-op in this state");
                on_close(Ok(()));
            }
        }
    }
}

// ============================================================================
// Shared
// ============================================================================

/// State visible to both the public handle and the task.
pub(crate) struct Shared {
    /// Published lifecycle state. Only the task writes it.
    state: watch::Sender<ConnectionState>,
    /// Set by `close`; never cleared.
    closing: AtomicBool,
}

impl Shared {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Self {
            state,
            closing: AtomicBool::new(false),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    #[inline]
    pub(crate) fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    #[inline]
    pub(crate) fn mark_closing(&self) {
        self.closing.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub(crate) fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    fn transition(&self, next: ConnectionState) {
        let previous = self.state.send_replace(next);
        debug_assert!(
            previous.can_transition_to(next),
            "illegal transition {previous} -> {next}"
        );
        debug!(from = %previous, to = %next, "State transition");
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why the establish chain stopped before the session opened.
enum Abort {
    /// A stage failed.
    Failed(Error),
    /// `Close` arrived, or every handle was dropped (`None`).
    Cancelled(Option<CompletionHandler>),
}

/// Result of one inbound read.
enum Inbound {
    Text(String),
    Skip,
    End(SessionEnd),
}

/// Why the session loop stopped.
enum SessionEnd {
    /// The server sent a close frame.
    PeerClosed(Option<CloseFrame>),
    /// Transport or protocol error, or the stream ended without a close frame.
    Failed(Error),
    /// `Close` was called.
    CloseRequested(CompletionHandler),
    /// Every handle was dropped; the outstanding read is abandoned.
    Cancelled,
}

// ============================================================================
// Strand
// ============================================================================

/// The per-client task.
pub(crate) struct Strand {
    config: Arc<ClientConfig>,
    shared: Arc<Shared>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Strand {
    /// Spawns the task for one client on `runtime`.
    pub(crate) fn spawn(
        id: ClientId,
        config: Arc<ClientConfig>,
        shared: Arc<Shared>,
        commands: mpsc::UnboundedReceiver<Command>,
        runtime: &Handle,
    ) {
        let span = info_span!(
            "ws_client",
            id = %id,
            host = %config.host(),
            port = config.port()
        );

        let strand = Self {
            config,
            shared,
            commands,
        };

        runtime.spawn(strand.run().instrument(span));
    }

    async fn run(mut self) {
        if let Some(handlers) = self.wait_for_connect().await {
            self.run_lifecycle(handlers).await;
        }
        self.drain().await;
        debug!("Client task terminated");
    }

    /// Waits in `Idle` for the first `Connect`.
    async fn wait_for_connect(&mut self) -> Option<Handlers> {
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Connect(handlers) => return Some(handlers),
                Command::Close { on_close } => {
                    self.shared.transition(ConnectionState::Closed);
                    on_close(Ok(()));
                    return None;
                }
                other => other.reject(self.shared.state()),
            }
        }
        None
    }

    /// Rejects everything until the last handle is dropped.
    async fn drain(&mut self) {
        while let Some(command) = self.commands.recv().await {
            command.reject(self.shared.state());
        }
    }

    async fn run_lifecycle(&mut self, handlers: Handlers) {
        let (on_connect, mut session) = handlers.split();

        match self.establish().await {
            Ok(stream) => self.open(stream, on_connect, &mut session).await,
            Err(Abort::Failed(e)) => {
                warn!(error = %e, kind = %e.kind(), "Connection failed");
                self.shared.transition(ConnectionState::Failed);
                on_connect(Err(e));
            }
            Err(Abort::Cancelled(on_close)) => {
                info!("Connection attempt cancelled");
                self.shared.transition(ConnectionState::Closed);
                on_connect(Err(Error::Cancelled));
                if let Some(on_close) = on_close {
                    on_close(Ok(()));
                }
            }
        }
    }

    // ========================================================================
    // Establish
    // ========================================================================

    async fn establish(&mut self) -> StdResult<ClientStream, Abort> {
        let config = Arc::clone(&self.config);

        self.shared.transition(ConnectionState::Resolving);
        let addr = self
            .stage(handshake::resolve(config.host(), config.port()))
            .await?;

        self.shared.transition(ConnectionState::Connecting);
        let tcp = self
            .stage(handshake::connect(addr, config.nodelay()))
            .await?;

        self.shared.transition(ConnectionState::Handshaking);
        self.stage(handshake::upgrade(tcp, &config)).await
    }

    /// Drives one stage while still answering commands.
    async fn stage<T>(&mut self, fut: impl Future<Output = Result<T>>) -> StdResult<T, Abort> {
        tokio::pin!(fut);

        loop {
            tokio::select! {
                result = &mut fut => return result.map_err(Abort::Failed),

                command = self.commands.recv() => match command {
                    Some(Command::Close { on_close }) => {
                        return Err(Abort::Cancelled(Some(on_close)));
                    }
                    Some(other) => other.reject(self.shared.state()),
                    None => return Err(Abort::Cancelled(None)),
                },
            }
        }
    }

    // ========================================================================
    // Session
    // ========================================================================

    async fn open(
        &mut self,
        stream: ClientStream,
        on_connect: ConnectHandler,
        session: &mut SessionHandlers,
    ) {
        self.shared.transition(ConnectionState::Open);
        info!(uri = %self.config.request_uri(), "WebSocket session open");

        // Must return before the first read is polled.
        on_connect(Ok(()));

        let (mut sink, mut source) = stream.split();

        let end = loop {
            tokio::select! {
                frame = source.next() => match Self::classify(frame) {
                    Inbound::Text(text) => {
                        trace!(len = text.len(), "Text message received");
                        session.message(text);
                    }
                    Inbound::Skip => {}
                    Inbound::End(end) => break end,
                },

                command = self.commands.recv() => match command {
                    Some(Command::Send { message, on_send }) => {
                        let result = Self::write_text(&mut sink, message).await;
                        on_send(result);
                    }
                    Some(Command::Close { on_close }) => break SessionEnd::CloseRequested(on_close),
                    Some(other) => other.reject(ConnectionState::Open),
                    None => break SessionEnd::Cancelled,
                },
            }
        };

        match end {
            SessionEnd::PeerClosed(frame) => {
                let (code, reason) = frame.map_or((u16::from(CloseCode::Status), String::new()), |f| {
                    (u16::from(f.code), f.reason.to_string())
                });
                info!(code, %reason, "WebSocket closed by peer");

                // Flushes the queued close reply.
                if let Err(e) = sink.close().await {
                    debug!(error = %e, "Failed to flush close reply");
                }

                self.shared.transition(ConnectionState::Closed);
                session.disconnect(Err(Error::closed_by_peer(code, reason)));
            }
            SessionEnd::Failed(e) => {
                error!(error = %e, "WebSocket session failed");
                self.shared.transition(ConnectionState::Failed);
                session.disconnect(Err(e));
            }
            SessionEnd::CloseRequested(on_close) => {
                self.teardown(sink, source, on_close, session).await;
            }
            SessionEnd::Cancelled => {
                self.cancel(sink, session).await;
            }
        }
    }

    /// Writes one text frame. At most one write is in flight.
    async fn write_text(sink: &mut WsSink, message: String) -> Result<()> {
        let len = message.len();
        match sink.send(Message::Text(message.into())).await {
            Ok(()) => {
                trace!(len, "Text message sent");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Send failed");
                Err(Error::write(e))
            }
        }
    }

    /// Maps one read completion onto the session loop.
    fn classify(frame: Option<StdResult<Message, WsError>>) -> Inbound {
        match frame {
            Some(Ok(Message::Text(text))) => Inbound::Text(text.as_str().to_owned()),
            Some(Ok(Message::Binary(data))) => {
                warn!(len = data.len(), "Binary message ignored: text frames only");
                Inbound::Skip
            }
            Some(Ok(Message::Close(frame))) => Inbound::End(SessionEnd::PeerClosed(frame)),
            // Ping/Pong are answered by tungstenite.
            Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => Inbound::Skip,
            Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                Inbound::End(SessionEnd::Failed(Error::stream_ended()))
            }
            Some(Err(e)) => Inbound::End(SessionEnd::Failed(Error::read(e))),
        }
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    async fn teardown(
        &mut self,
        mut sink: WsSink,
        mut source: WsSource,
        on_close: CompletionHandler,
        session: &mut SessionHandlers,
    ) {
        self.shared.mark_closing();
        self.shared.transition(ConnectionState::Closing);
        info!("Closing WebSocket session");

        let initiated = sink
            .send(Message::Close(Some(normal_close())))
            .await
            .map_err(Error::close);
        on_close(Ok(()));

        let result = match initiated {
            Ok(()) => self.await_close_ack(&mut source).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(()) => info!("WebSocket session closed"),
            Err(e) => warn!(error = %e, "Close handshake failed"),
        }

        self.shared.transition(ConnectionState::Closed);
        session.disconnect(result);
    }

    /// Reads until the peer acknowledges the close. Frames arriving
    /// meanwhile are discarded.
    async fn await_close_ack(&mut self, source: &mut WsSource) -> Result<()> {
        let mut commands_open = true;

        loop {
            tokio::select! {
                frame = source.next() => match frame {
                    Some(Ok(Message::Close(_)))
                    | Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed))
                    | None => return Ok(()),
                    Some(Ok(_)) => trace!("Frame discarded while closing"),
                    Some(Err(e)) => return Err(Error::close(e)),
                },

                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => command.reject(ConnectionState::Closing),
                    None => commands_open = false,
                },
            }
        }
    }

    /// Abandons the session after every handle was dropped.
    async fn cancel(&mut self, mut sink: WsSink, session: &mut SessionHandlers) {
        debug!("All client handles dropped; cancelling read");

        if !self.shared.is_closing() && !session.disconnect_reported() {
            session.disconnect(Err(Error::Cancelled));
        }

        if let Err(e) = sink.send(Message::Close(Some(normal_close()))).await {
            debug!(error = %e, "Failed to send close frame on cancellation");
        }

        self.shared.transition(ConnectionState::Closed);
    }
}

/// Close frame with code 1000.
fn normal_close() -> CloseFrame {
    CloseFrame {
        code: CloseCode::Normal,
        reason: Utf8Bytes::from_static(""),
    }
}

// ============================================================================
// Tests
// ============================================================================
