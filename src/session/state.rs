/// Connection status of the wallet session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Point-in-time view of the wallet session.
///
/// `account` and `chain_id` are either both set or both absent; no update
/// ever publishes one without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub account: Option<String>,
    pub chain_id: Option<String>,
    /// Message from the last failed connection attempt
    pub error: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            account: None,
            chain_id: None,
            error: None,
        }
    }
}

impl SessionSnapshot {
    pub fn is_connected(&self) -> bool {
        self.status == SessionStatus::Connected
    }
}

/// Notification delivered to session subscribers, one per state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Ordinary transition: status, account, or error changed
    Updated(SessionSnapshot),
    /// The chain switched. Cached on-chain state is invalid; every
    /// subscription must discard its data and re-arm.
    HardReset(SessionSnapshot),
}

impl SessionEvent {
    pub fn snapshot(&self) -> &SessionSnapshot {
        match self {
            SessionEvent::Updated(snapshot) => snapshot,
            SessionEvent::HardReset(snapshot) => snapshot,
        }
    }
}
