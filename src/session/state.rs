//! Session lifecycle states.

/// Lifecycle state of a [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum SessionState {
    /// Handshake in progress; the endpoint has not been opened yet.
    #[default]
    Connecting,
    /// The endpoint has been opened.
    Open,
    /// A close has been requested but not yet completed.
    Closing,
    /// The session is closed.
    Closed,
}

impl SessionState {
    /// Check if the session has not reached `Closed`.
    #[must_use]
    #[inline]
    pub const fn is_active(&self) -> bool {
        !matches!(self, SessionState::Closed)
    }

    /// Check if moving from this state to `next` is a legal lifecycle step.
    ///
    /// States only move forward; any active state may close directly.
    #[must_use]
    pub const fn can_transition_to(&self, next: SessionState) -> bool {
        matches!(
            (*self, next),
            (SessionState::Connecting, SessionState::Open)
                | (SessionState::Connecting, SessionState::Closed)
                | (SessionState::Open, SessionState::Closing)
                | (SessionState::Open, SessionState::Closed)
                | (SessionState::Closing, SessionState::Closed)
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::Open => write!(f, "Open"),
            SessionState::Closing => write!(f, "Closing"),
            SessionState::Closed => write!(f, "Closed"),
        }
    }
}
