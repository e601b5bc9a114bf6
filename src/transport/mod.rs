//! WebSocket transport layer.
//!
//! # Connection Lifecycle
//!
//! ```text
//! connect ─► resolve ─► TCP connect ─► upgrade ─► Open ─► close ─► Closed
//!               │            │             │        │
//!               └────────────┴─────────────┴────────┴──► Failed
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Per-client task and session event loop |
//! | `handshake` | Resolve, connect and upgrade stages |
//! | `state` | Lifecycle state machine |

// ============================================================================
// Submodules
// ============================================================================

/// Per-client task and session event loop.
pub(crate) mod connection;

/// Connection establishment stages.
pub(crate) mod handshake;

/// Lifecycle states.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use state::ConnectionState;
