//! Application events for the event-driven architecture

use serde::{Deserialize, Serialize};

/// Events that can occur in the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A new session was started
    SessionStarted {
        session_id: String,
    },

    /// A message was forwarded to the chat service
    MessageSent {
        session_id: String,
        chars: usize,
    },

    /// The chat service answered
    ReplyReceived {
        session_id: String,
        bytes: usize,
    },

    /// The exchange failed and an error reply was shown instead
    RelayFailed {
        session_id: String,
        error: String,
    },

    /// Application is shutting down
    Shutdown,
}
