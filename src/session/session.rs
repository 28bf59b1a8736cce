//! Session identity

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A chat session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    started_at: DateTime<Utc>,
}

impl Session {
    /// Start a new session with a fresh random identifier
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
        }
    }

    /// Identifier forwarded to the chat service as `contextId`
    pub fn context_id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// First block of the id, enough to tell sessions apart on screen
    pub fn short_id(&self) -> &str {
        self.id.split('-').next().unwrap_or(&self.id)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
