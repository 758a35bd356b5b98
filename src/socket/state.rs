//! Connection state machine
//!
//! ```text
//! Idle -> Connecting -> Open -> Closed
//!             |          \---> Failed
//!             \--------------> Failed
//! ```

use std::fmt;

use parking_lot::Mutex;
use tracing::warn;

/// Lifecycle state of a `SecureSocket`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Constructed, no network activity yet
    Idle,
    /// Dialling and handshaking
    Connecting,
    /// Handshake complete, `send` is meaningful
    Open,
    /// Ended cleanly
    Closed,
    /// Ended by a transport error
    Failed,
}

impl ConnectionState {
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Open)
                | (Connecting, Failed)
                | (Open, Closed)
                | (Open, Failed)
        )
    }

    /// No further transitions or notifications after this state
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed)
    }

    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Shared, lock-protected state cell
#[derive(Debug)]
pub(crate) struct StateCell(Mutex<ConnectionState>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Mutex::new(ConnectionState::Idle))
    }

    pub(crate) fn get(&self) -> ConnectionState {
        *self.0.lock()
    }

    /// Move to `next` if the transition is legal, returning whether it happened
    pub(crate) fn advance(&self, next: ConnectionState) -> bool {
        let mut state = self.0.lock();
        if state.can_transition_to(next) {
            *state = next;
            true
        } else {
            warn!("Ignoring illegal state transition {} -> {}", *state, next);
            false
        }
    }

    /// Idle -> Connecting, or the state that prevented it
    pub(crate) fn begin_connect(&self) -> Result<(), ConnectionState> {
        let mut state = self.0.lock();
        match *state {
            ConnectionState::Idle => {
                *state = ConnectionState::Connecting;
                Ok(())
            }
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL: [ConnectionState; 5] = [Idle, Connecting, Open, Closed, Failed];

    #[test]
    fn test_legal_transitions() {
        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Open));
        assert!(Connecting.can_transition_to(Failed));
        assert!(Open.can_transition_to(Closed));
        assert!(Open.can_transition_to(Failed));
    }

    #[test]
    fn test_no_shortcuts() {
        assert!(!Idle.can_transition_to(Open));
        assert!(!Connecting.can_transition_to(Closed));
        assert!(!Open.can_transition_to(Connecting));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [Closed, Failed] {
            assert!(terminal.is_terminal());
            for next in ALL {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_state_cell_connect_once() {
        let cell = StateCell::new();
        assert_eq!(cell.begin_connect(), Ok(()));
        assert_eq!(cell.begin_connect(), Err(Connecting));

        assert!(cell.advance(Open));
        assert_eq!(cell.begin_connect(), Err(Open));

        assert!(cell.advance(Closed));
        assert!(!cell.advance(Failed));
        assert_eq!(cell.get(), Closed);
    }
}
