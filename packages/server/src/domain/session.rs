//! Connection Session state machine.
//!
//! ```text
//! Connecting -> Resolving -> Joined -> Closed
//!                   |                    ^
//!                   +----> Rejected -----+
//! ```
//!
//! Transitions are one-directional. A disconnect while `Resolving` also ends
//! in `Closed`, so a late resolution can see that it must not join.

use super::{
    error::SessionStateError,
    value_object::{ConnectionId, OriginId, RoomId},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Resolving,
    Joined(RoomId),
    Rejected,
    Closed,
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Resolving => "Resolving",
            Self::Joined(_) => "Joined",
            Self::Rejected => "Rejected",
            Self::Closed => "Closed",
        }
    }
}

/// Server-side lifecycle of one physical connection
#[derive(Debug, Clone)]
pub struct ConnectionSession {
    pub connection_id: ConnectionId,
    pub origin_id: OriginId,
    state: SessionState,
}

impl ConnectionSession {
    pub fn new(connection_id: ConnectionId, origin_id: OriginId) -> Self {
        Self {
            connection_id,
            origin_id,
            state: SessionState::Connecting,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    pub fn begin_resolving(&mut self) -> Result<(), SessionStateError> {
        match self.state {
            SessionState::Connecting => {
                self.state = SessionState::Resolving;
                Ok(())
            }
            _ => Err(self.invalid("Resolving")),
        }
    }

    pub fn join(&mut self, room_id: RoomId) -> Result<(), SessionStateError> {
        match self.state {
            SessionState::Resolving => {
                self.state = SessionState::Joined(room_id);
                Ok(())
            }
            _ => Err(self.invalid("Joined")),
        }
    }

    pub fn reject(&mut self) -> Result<(), SessionStateError> {
        match self.state {
            SessionState::Resolving => {
                self.state = SessionState::Rejected;
                Ok(())
            }
            _ => Err(self.invalid("Rejected")),
        }
    }

    /// Close the session. Closing twice is a no-op.
    ///
    /// Returns the room the session was joined to, if any.
    pub fn close(&mut self) -> Option<RoomId> {
        match std::mem::replace(&mut self.state, SessionState::Closed) {
            SessionState::Joined(room_id) => Some(room_id),
            _ => None,
        }
    }

    fn invalid(&self, to: &'static str) -> SessionStateError {
        SessionStateError::InvalidTransition {
            from: self.state.name(),
            to,
        }
    }
}
