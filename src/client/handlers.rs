//! Callback registrations.
//!
//! The three session callbacks are bound together in one [`Handlers`] value
//! and handed to [`Client::connect`](crate::Client::connect) once. Per-call
//! completions (`send`, `close`) are single-shot closures.
//!
//! All callbacks of one client run on that client's task, one at a time.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Receives the outcome of resolve/connect/handshake. Invoked exactly once.
pub type ConnectHandler = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// Receives each incoming text message, in order. Owns the message.
pub type MessageHandler = Box<dyn FnMut(String) + Send + 'static>;

/// Receives the final outcome of the session. Invoked at most once.
pub type DisconnectHandler = Box<dyn FnOnce(Result<()>) + Send + 'static>;

/// Receives the outcome of a single `send` or `close` call.
pub type CompletionHandler = Box<dyn FnOnce(Result<()>) + Send + 'static>;

// ============================================================================
// Handlers
// ============================================================================

/// The session callbacks passed to [`Client::connect`](crate::Client::connect).
///
/// Slots that are not set default to no-ops.
///
/// # Example
///
/// ```
/// use ws_lifecycle_client::Handlers;
///
/// let handlers = Handlers::new()
///     .on_connect(|result| println!("connected: {}", result.is_ok()))
///     .on_message(|text| println!("received: {text}"))
///     .on_disconnect(|result| println!("disconnected: {result:?}"));
/// # drop(handlers);
/// ```
pub struct Handlers {
    pub(crate) on_connect: ConnectHandler,
    pub(crate) on_message: MessageHandler,
    pub(crate) on_disconnect: DisconnectHandler,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            on_connect: Box::new(|_| {}),
            on_message: Box::new(|_| {}),
            on_disconnect: Box::new(|_| {}),
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}

impl Handlers {
    /// Creates a set of no-op handlers.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connect callback.
    #[must_use]
    pub fn on_connect<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.on_connect = Box::new(f);
        self
    }

    /// Sets the message callback.
    #[must_use]
    pub fn on_message<F>(mut self, f: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        self.on_message = Box::new(f);
        self
    }

    /// Sets the disconnect callback.
    #[must_use]
    pub fn on_disconnect<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        self.on_disconnect = Box::new(f);
        self
    }

    /// Splits into the connect slot and the session slots.
    pub(crate) fn split(self) -> (ConnectHandler, SessionHandlers) {
        (
            self.on_connect,
            SessionHandlers {
                on_message: self.on_message,
                on_disconnect: Some(self.on_disconnect),
            },
        )
    }
}

// ============================================================================
// SessionHandlers
// ============================================================================

/// The callbacks that outlive the connect stage.
///
/// The disconnect slot is emptied on first delivery, so a second report
/// cannot reach the caller.
pub(crate) struct SessionHandlers {
    on_message: MessageHandler,
    on_disconnect: Option<DisconnectHandler>,
}

impl SessionHandlers {
    /// Hands one message to the caller.
    pub(crate) fn message(&mut self, text: String) {
        (self.on_message)(text);
    }

    /// Reports the end of the session. Returns `false` if already reported.
    pub(crate) fn disconnect(&mut self, result: Result<()>) -> bool {
        match self.on_disconnect.take() {
            Some(on_disconnect) => {
                on_disconnect(result);
                true
            }
            None => false,
        }
    }

    /// Returns `true` once the disconnect callback has fired.
    #[inline]
    pub(crate) fn disconnect_reported(&self) -> bool {
        self.on_disconnect.is_none()
    }
}

// ============================================================================
// Tests
// ============================================================================
