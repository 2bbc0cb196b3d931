//! Access to the corpus web search interface.
//!
//! Pages are retrieved through the [`PageSource`] trait. [`HttpClient`](crate::utils::HttpClient)
//! is the production implementation and [`MockPageSource`] serves canned pages in tests.
//! On top of it:
//!
//! - [`Webpage`]: one address, fetched with a politeness delay and retry, decoded and parsed
//! - [`counts`] and [`ResultPage`]: pull numbers and result entries out of a parsed page
//! - [`CorpusClient`]: ties queries, fetching and extraction together

mod client;
mod extract;
pub mod mock;
mod webpage;

pub use client::CorpusClient;
pub use extract::{counts, parse_selector, ResultPage};
pub use mock::MockPageSource;
pub use webpage::Webpage;

use async_trait::async_trait;

use crate::models::QueryError;
use crate::utils::DigitsError;

/// Retrieves the raw bytes stored at a URL
#[async_trait]
pub trait PageSource: Send + Sync + std::fmt::Debug {
    /// Fetch `url`, failing with a transient error when the server throttles us
    async fn open(&self, url: &str) -> Result<Vec<u8>, CorpusError>;
}

/// Errors that can occur when talking to the corpus
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// The server is rate limiting us
    #[error("Throttled by server (HTTP {0})")]
    Throttled(u16),

    /// Unsuccessful HTTP status
    #[error("HTTP error: status {0}")]
    Http(u16),

    /// The page did not have the expected structure
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Encoding label not known to the decoder
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Malformed query URL
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Count text without usable digits
    #[error(transparent)]
    Digits(#[from] DigitsError),

    /// Transient failures persisted past the retry policy
    #[error("Gave up on {address} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        address: String,
        attempts: u32,
        #[source]
        last_error: Box<CorpusError>,
    },
}

impl CorpusError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            CorpusError::Network(_) | CorpusError::Throttled(_) => true,
            CorpusError::Http(status) => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for CorpusError {
    fn from(err: reqwest::Error) -> Self {
        CorpusError::Network(err.to_string())
    }
}
