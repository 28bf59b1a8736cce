//! Error types for the relay client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    /// Connection, DNS, timeout, non-success status or body read failure.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl RelayError {
    /// Whether the request was abandoned because the timeout elapsed
    pub fn is_timeout(&self) -> bool {
        matches!(self, RelayError::Transport(e) if e.is_timeout())
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
