//! HTTP client utilities.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

use crate::corpus::{CorpusError, PageSource};

/// User agent sent by default; the corpus serves plain clients less reliably.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10_3) \
                                      AppleWebKit/600.5.17 (KHTML, like Gecko) \
                                      Version/8.0.5 Safari/600.5.17";

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, CorpusError> {
        Self::with_settings(DEFAULT_USER_AGENT, Duration::from_secs(30))
    }

    /// Create a new HTTP client with a custom user agent and request timeout
    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self, CorpusError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| CorpusError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Create from an existing reqwest Client
    pub fn from_client(client: Arc<Client>) -> Self {
        Self { client }
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Map a non-success status onto the error taxonomy.
fn status_error(status: StatusCode) -> CorpusError {
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
        CorpusError::Throttled(status.as_u16())
    } else {
        CorpusError::Http(status.as_u16())
    }
}

#[async_trait]
impl PageSource for HttpClient {
    async fn open(&self, url: &str) -> Result<Vec<u8>, CorpusError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html")
            .send()
            .await
            .map_err(|e| CorpusError::Network(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CorpusError::Network(format!("Failed to read response: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_returns_raw_bytes() {
        let mut server = mockito::Server::new_async().await;
        let body: &[u8] = &[0xF3, 0xF7, 0xE8, 0xF2, 0xE0, 0xF2, 0xFC];
        let mock = server
            .mock("GET", "/search.xml")
            .with_status(200)
            .with_header("content-type", "text/html; charset=windows-1251")
            .with_body(body)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let content = client
            .open(&format!("{}/search.xml", server.url()))
            .await
            .unwrap();

        assert_eq!(content, body);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_open_classifies_throttling() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search.xml")
            .with_status(429)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result = client.open(&format!("{}/search.xml", server.url())).await;

        match result {
            Err(err @ CorpusError::Throttled(429)) => assert!(err.is_transient()),
            other => panic!("Expected Throttled, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_open_not_found_is_permanent() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result = client.open(&format!("{}/missing", server.url())).await;

        match result {
            Err(err @ CorpusError::Http(404)) => assert!(!err.is_transient()),
            other => panic!("Expected Http(404), got {:?}", other),
        }
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE),
            CorpusError::Throttled(503)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            CorpusError::Http(500)
        ));
    }
}
