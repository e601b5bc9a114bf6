//! WS Lifecycle Client - callback-driven WebSocket client.
//!
//! A [`Client`] drives one connection through resolve, TCP connect,
//! WebSocket upgrade, an open session and an orderly close. Every operation
//! returns immediately and reports its outcome to a callback.
//!
//! # Architecture
//!
//! - Each [`Client`] owns one tokio task; all of its callbacks run there,
//!   one at a time, in the order the events happened
//! - Public operations enqueue a command and never invoke a callback inline
//! - Sends are written strictly one after another, in call order
//! - The disconnect callback fires at most once per session
//! - Callbacks that call back into the client capture a [`WeakClient`]
//!
//! # Quick Start
//!
//! ```no_run
//! use tokio::runtime::Handle;
//! use ws_lifecycle_client::{Client, ClientConfig, Handlers, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::builder()
//!         .host("ws.ifelse.io")
//!         .endpoint("/")
//!         .port(80)
//!         .build()?;
//!
//!     let client = Client::new(config, &Handle::current());
//!     let sender = client.downgrade();
//!     let closer = client.downgrade();
//!
//!     client.connect(
//!         Handlers::new()
//!             .on_connect(move |result| match (result, sender.upgrade()) {
//!                 (Ok(()), Some(client)) => client.send("Hello, server!", |_| {}),
//!                 (Ok(()), None) => {}
//!                 (Err(e), _) => eprintln!("connect failed: {e}"),
//!             })
//!             .on_message(move |text| {
//!                 println!("received: {text}");
//!                 if let Some(client) = closer.upgrade() {
//!                     client.close(|_| {});
//!                 }
//!             })
//!             .on_disconnect(|result| println!("disconnected: {result:?}")),
//!     );
//!
//!     // Dropping the last `Client` cancels the session.
//!     let mut states = client.state_receiver();
//!     let _ = states.wait_for(|s| s.is_terminal()).await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], configuration and callbacks |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`transport`] | Connection stages and state machine |

// ============================================================================
// Modules
// ============================================================================

/// Client handle, configuration and callbacks.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations report [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// WebSocket transport layer.
///
/// Connection stages, the per-client task and the lifecycle state machine.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{Client, ClientBuilder, ClientConfig, Handlers, WeakClient};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::ClientId;

// Transport types
pub use transport::ConnectionState;
