//! Connection lifecycle states.
//!
//! ```text
//! Idle → Resolving → Connecting → Handshaking → Open → Closing → Closed
//!   └──────────┴───────────┴────────────┴────────┴───────┴──→ Failed
//! ```
//!
//! `Closed` and `Failed` are terminal. `Open` is the only state that accepts
//! sends and the only one in which the read loop is armed.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`Client`](crate::Client).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Constructed, `connect` not yet processed.
    #[default]
    Idle,
    /// Looking up the configured host.
    Resolving,
    /// Opening the TCP connection.
    Connecting,
    /// Performing the WebSocket upgrade.
    Handshaking,
    /// Session established.
    Open,
    /// Close frame sent, waiting for the acknowledgement.
    Closing,
    /// Session ended.
    Closed,
    /// A stage failed.
    Failed,
}

impl ConnectionState {
    /// Returns `true` for `Closed` and `Failed`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// Returns `true` while resolve/connect/handshake is in flight.
    #[inline]
    #[must_use]
    pub const fn is_establishing(self) -> bool {
        matches!(self, Self::Resolving | Self::Connecting | Self::Handshaking)
    }

    /// Returns `true` if `send` is accepted in this state.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if moving to `next` is a legal lifecycle edge.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState::{
            Closed, Closing, Connecting, Failed, Handshaking, Idle, Open, Resolving,
        };

        match (self, next) {
            (Closed | Failed, _) => false,
            (_, Failed) => true,
            (Idle, Resolving | Closed)
            | (Resolving, Connecting | Closed)
            | (Connecting, Handshaking | Closed)
            | (Handshaking, Open | Closed)
            | (Open, Closing | Closed)
            | (Closing, Closed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ConnectionState; 8] = [
        ConnectionState::Idle,
        ConnectionState::Resolving,
        ConnectionState::Connecting,
        ConnectionState::Handshaking,
        ConnectionState::Open,
        ConnectionState::Closing,
        ConnectionState::Closed,
        ConnectionState::Failed,
    ];

    #[test]
    fn test_default_is_idle() {
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }

    #[test]
    fn test_forward_chain_is_legal() {
        let chain = [
            ConnectionState::Idle,
            ConnectionState::Resolving,
            ConnectionState::Connecting,
            ConnectionState::Handshaking,
            ConnectionState::Open,
            ConnectionState::Closing,
            ConnectionState::Closed,
        ];
        for pair in chain.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!ConnectionState::Idle.can_transition_to(ConnectionState::Open));
        assert!(!ConnectionState::Resolving.can_transition_to(ConnectionState::Handshaking));
        assert!(!ConnectionState::Open.can_transition_to(ConnectionState::Resolving));
        assert!(!ConnectionState::Closing.can_transition_to(ConnectionState::Open));
    }

    #[test]
    fn test_failed_reachable_from_every_non_terminal() {
        for state in ALL {
            assert_eq!(
                state.can_transition_to(ConnectionState::Failed),
                !state.is_terminal(),
                "{state}"
            );
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in ALL {
            assert!(!ConnectionState::Closed.can_transition_to(next));
            assert!(!ConnectionState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_only_open_accepts_send() {
        let open: Vec<_> = ALL.into_iter().filter(|s| s.is_open()).collect();
        assert_eq!(open, vec![ConnectionState::Open]);
    }

    #[test]
    fn test_establishing_states() {
        assert!(ConnectionState::Resolving.is_establishing());
        assert!(ConnectionState::Connecting.is_establishing());
        assert!(ConnectionState::Handshaking.is_establishing());
        assert!(!ConnectionState::Idle.is_establishing());
        assert!(!ConnectionState::Open.is_establishing());
    }
}
