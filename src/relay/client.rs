//! HTTP client for the remote chat service

use std::time::Duration;

use reqwest::{Client, Url};
use tracing::debug;

use super::errors::{RelayError, RelayResult};

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";

/// Route that keeps a conversation per context id on the server side
pub const CONTEXT_ROUTE: &str = "/ai/callWithContext";

/// Route that answers a single message with no conversation memory
pub const STATELESS_ROUTE: &str = "/ai/call";

/// Every request is abandoned after this long.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Validate an endpoint and normalize it to a base without trailing slash
pub fn parse_endpoint(endpoint: &str) -> RelayResult<String> {
    let trimmed = endpoint.trim();
    if trimmed.is_empty() {
        return Err(RelayError::InvalidEndpoint("endpoint is empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| RelayError::InvalidEndpoint(format!("{}: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RelayError::InvalidEndpoint(format!(
            "{}: scheme must be http or https",
            trimmed
        )));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(RelayError::InvalidEndpoint(format!(
            "{}: endpoint must not carry a query or fragment",
            trimmed
        )));
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Blocking-per-message client for the chat service
#[derive(Debug, Clone)]
pub struct RelayClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl RelayClient {
    /// Create a client for the given endpoint base URL
    pub fn new(endpoint: &str) -> RelayResult<Self> {
        Self::build(endpoint, REQUEST_TIMEOUT)
    }

    #[cfg(test)]
    pub(crate) fn with_timeout(endpoint: &str, timeout: Duration) -> RelayResult<Self> {
        Self::build(endpoint, timeout)
    }

    fn build(endpoint: &str, timeout: Duration) -> RelayResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// URL of a context-aware call for `message` within `context_id`
    pub fn context_url(&self, message: &str, context_id: &str) -> String {
        format!(
            "{}{}?message={}&contextId={}",
            self.endpoint,
            CONTEXT_ROUTE,
            urlencoding::encode(message),
            urlencoding::encode(context_id)
        )
    }

    /// URL of a stateless call for `message`
    pub fn stateless_url(&self, message: &str) -> String {
        format!(
            "{}{}?message={}",
            self.endpoint,
            STATELESS_ROUTE,
            urlencoding::encode(message)
        )
    }

    /// Send a message that the server attaches to the conversation `context_id`
    pub async fn call_with_context(&self, message: &str, context_id: &str) -> RelayResult<String> {
        self.get_text(self.context_url(message, context_id)).await
    }

    /// Send a message with no conversation context
    pub async fn call(&self, message: &str) -> RelayResult<String> {
        self.get_text(self.stateless_url(message)).await
    }

    async fn get_text(&self, url: String) -> RelayResult<String> {
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let status = response.status();
        let body = response.text().await?;

        debug!("Received {} ({} bytes)", status, body.len());
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP stub: accepts a single connection, records the request
    //! head and writes a canned response.

    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    pub fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Returns the base URL and a handle resolving to the request head
    pub async fn serve_once(response: String, delay: Duration) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            tokio::time::sleep(delay).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&head).into_owned()
        });

        (base, handle)
    }

    /// A base URL nothing is listening on
    pub async fn closed_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    /// First line of a request head, e.g. `GET /path?query HTTP/1.1`
    pub fn request_line(head: &str) -> &str {
        head.lines().next().unwrap_or_default()
    }
}
