//! A single corpus page, fetched politely.

use encoding_rs::Encoding;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;

use crate::corpus::{CorpusError, PageSource};
use crate::utils::{decode, encoding_for_label, fetch_with_retry, RetryPolicy, DEFAULT_ENCODING};

/// A web page at a fixed address.
///
/// Every load waits for the politeness delay first and retries throttled
/// requests according to the retry policy.
#[derive(Debug, Clone)]
pub struct Webpage {
    source: Arc<dyn PageSource>,
    address: String,
    delay: Duration,
    encoding: &'static Encoding,
    policy: RetryPolicy,
}

impl Webpage {
    /// Page at `address` with a one second delay, windows-1251 decoding and
    /// the default (bounded) retry policy.
    pub fn new(source: Arc<dyn PageSource>, address: impl Into<String>) -> Self {
        Self {
            source,
            address: address.into(),
            delay: Duration::from_secs(1),
            encoding: DEFAULT_ENCODING,
            policy: RetryPolicy::default(),
        }
    }

    /// Set the politeness delay
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Decode pages with `encoding`
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Decode pages with the encoding named `label`
    pub fn encoding_label(self, label: &str) -> Result<Self, CorpusError> {
        let encoding = encoding_for_label(label)
            .ok_or_else(|| CorpusError::UnknownEncoding(label.to_string()))?;
        Ok(self.encoding(encoding))
    }

    /// Set the retry policy
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Raw page content
    pub async fn bytes(&self) -> Result<Vec<u8>, CorpusError> {
        fetch_with_retry(self.source.as_ref(), &self.address, self.delay, self.policy).await
    }

    /// Page content decoded to text
    pub async fn html(&self) -> Result<String, CorpusError> {
        let bytes = self.bytes().await?;
        Ok(decode(&bytes, self.encoding))
    }

    /// Page content parsed into a document
    pub async fn document(&self) -> Result<Html, CorpusError> {
        let text = self.html().await?;
        Ok(Html::parse_document(&text))
    }
}
