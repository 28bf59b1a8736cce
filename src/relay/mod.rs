//! Message relay to the remote chat service
//!
//! Turns one chat turn into exactly one outbound HTTP call and one
//! displayable reply. Failures never escape: they come back as
//! [`Reply::Failed`] carrying text prefixed with [`ERROR_PREFIX`].

mod client;
mod errors;

pub use client::*;
pub use errors::*;

use tracing::{debug, warn};

use crate::session::Session;

/// Marker that starts every reply describing a failed exchange
pub const ERROR_PREFIX: &str = "❌ Erreur : ";

/// Render a relay failure the way it is shown in the chat
pub fn format_error(error: &RelayError) -> String {
    format!("{}{}", ERROR_PREFIX, error)
}

/// Outcome of one exchange, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Body returned by the service, unchanged
    Answer(String),
    /// Formatted failure text
    Failed(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer(text) | Reply::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Answer(text) | Reply::Failed(text) => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failed(_))
    }
}

/// Forwards chat messages for a session
#[derive(Debug, Clone)]
pub struct Relay {
    client: RelayClient,
    use_context: bool,
}

impl Relay {
    pub fn new(client: RelayClient, use_context: bool) -> Self {
        Self { client, use_context }
    }

    pub fn client(&self) -> &RelayClient {
        &self.client
    }

    pub fn uses_context(&self) -> bool {
        self.use_context
    }

    /// Forward `message` and return what to display, tagged with whether
    /// the exchange failed
    pub async fn handle_message(&self, session: &Session, message: &str) -> Reply {
        match self.send(session, message).await {
            Ok(body) => Reply::Answer(body),
            Err(e) => {
                if e.is_timeout() {
                    warn!("Request for session {} timed out", session.context_id());
                } else {
                    warn!("Request for session {} failed: {}", session.context_id(), e);
                }
                Reply::Failed(format_error(&e))
            }
        }
    }

    /// Forward `message` and keep the typed error
    pub async fn send(&self, session: &Session, message: &str) -> RelayResult<String> {
        debug!(
            "Relaying {} chars for session {}",
            message.chars().count(),
            session.context_id()
        );

        if self.use_context {
            self.client.call_with_context(message, session.context_id()).await
        } else {
            self.client.call(message).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_server::{closed_endpoint, request_line, response, serve_once};
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handle_message_success() {
        let (base, server) = serve_once(response("200 OK", "ok"), Duration::ZERO).await;
        let relay = Relay::new(RelayClient::new(&base).unwrap(), true);
        let session = Session::new();

        let reply = relay.handle_message(&session, "hello world").await;
        assert_eq!(reply, Reply::Answer("ok".to_string()));

        let head = server.await.unwrap();
        let expected = format!(
            "GET /ai/callWithContext?message=hello%20world&contextId={} HTTP/1.1",
            session.context_id()
        );
        assert_eq!(request_line(&head), expected);
    }

    #[tokio::test]
    async fn test_handle_message_preserves_body() {
        let body = "Réponse :\n  - point un\n  - point deux\n";
        let (base, _server) = serve_once(response("200 OK", body), Duration::ZERO).await;
        let relay = Relay::new(RelayClient::new(&base).unwrap(), true);

        let reply = relay.handle_message(&Session::new(), "liste").await;
        assert_eq!(reply.text(), body);
    }

    #[tokio::test]
    async fn test_answer_that_looks_like_an_error_is_still_an_answer() {
        let body = "❌ Erreur : this is what the service said";
        let (base, _server) = serve_once(response("200 OK", body), Duration::ZERO).await;
        let relay = Relay::new(RelayClient::new(&base).unwrap(), true);

        let reply = relay.handle_message(&Session::new(), "hi").await;
        assert_eq!(reply, Reply::Answer(body.to_string()));
        assert!(!reply.is_failure());
    }

    #[tokio::test]
    async fn test_handle_message_unreachable() {
        let relay = Relay::new(RelayClient::new(&closed_endpoint().await).unwrap(), true);

        let reply = relay.handle_message(&Session::new(), "hi").await;
        assert!(reply.is_failure());
        assert!(reply.text().starts_with("❌ Erreur : "));
        assert!(reply.text().len() > ERROR_PREFIX.len());
    }

    #[tokio::test]
    async fn test_handle_message_http_error() {
        let (base, _server) = serve_once(response("404 Not Found", "nope"), Duration::ZERO).await;
        let relay = Relay::new(RelayClient::new(&base).unwrap(), true);

        let reply = relay.handle_message(&Session::new(), "hi").await;
        assert!(reply.is_failure());
        assert!(reply.text().starts_with(ERROR_PREFIX));
        assert!(reply.text().contains("404"));
    }

    #[tokio::test]
    async fn test_handle_message_timeout() {
        let (base, server) = serve_once(response("200 OK", "late"), Duration::from_secs(2)).await;
        let client = RelayClient::with_timeout(&base, Duration::from_millis(200)).unwrap();
        let relay = Relay::new(client, true);

        let reply = relay.handle_message(&Session::new(), "hi").await;
        assert!(reply.is_failure());
        server.abort();
    }

    #[tokio::test]
    async fn test_without_context_no_context_id_is_sent() {
        let (base, server) = serve_once(response("200 OK", "ok"), Duration::ZERO).await;
        let relay = Relay::new(RelayClient::new(&base).unwrap(), false);

        relay.handle_message(&Session::new(), "hello").await;

        let head = server.await.unwrap();
        assert_eq!(request_line(&head), "GET /ai/call?message=hello HTTP/1.1");
        assert!(!head.contains("contextId"));
    }

    #[test]
    fn test_format_error() {
        let err = RelayError::InvalidEndpoint("nowhere".to_string());
        assert_eq!(format_error(&err), "❌ Erreur : Invalid endpoint: nowhere");
    }
}
