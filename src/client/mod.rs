//! Client module.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Handle that drives one connection lifecycle |
//! | [`WeakClient`] | Non-owning handle for use inside callbacks |
//! | [`ClientBuilder`] | Fluent configuration builder |
//! | [`ClientConfig`] | Validated target and protocol limits |
//! | [`Handlers`] | Session callbacks passed to `connect` |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for client configuration.
pub mod builder;

/// The client handle and its operations.
pub mod core;

/// Callback types.
pub mod handlers;

/// Validated client configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{Client, WeakClient};
pub use builder::ClientBuilder;
pub use handlers::{CompletionHandler, ConnectHandler, DisconnectHandler, Handlers, MessageHandler};
pub use options::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_PORT};
