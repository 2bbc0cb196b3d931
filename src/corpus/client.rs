//! High-level access to corpus searches.

use encoding_rs::Encoding;
use scraper::{Html, Selector};
use std::sync::Arc;

use crate::config::Config;
use crate::corpus::{counts, parse_selector, CorpusError, PageSource, ResultPage, Webpage};
use crate::models::Query;
use crate::utils::{encoding_for_label, HttpClient, RetryPolicy};

/// Runs queries against the corpus and reads their results.
///
/// Fetches happen one at a time; each one waits for the configured
/// politeness delay and retries under its own retry state.
#[derive(Debug, Clone)]
pub struct CorpusClient {
    source: Arc<dyn PageSource>,
    config: Config,
    encoding: &'static Encoding,
    policy: RetryPolicy,
    documents: Selector,
    contexts: Selector,
    pager: Selector,
}

impl CorpusClient {
    /// Client fetching over HTTP
    pub fn new(config: Config) -> Result<Self, CorpusError> {
        let http = HttpClient::with_settings(&config.fetch.user_agent, config.fetch.timeout())?;
        Self::with_source(config, Arc::new(http))
    }

    /// Client fetching pages from `source`
    pub fn with_source(config: Config, source: Arc<dyn PageSource>) -> Result<Self, CorpusError> {
        let encoding = encoding_for_label(&config.fetch.encoding)
            .ok_or_else(|| CorpusError::UnknownEncoding(config.fetch.encoding.clone()))?;

        Ok(Self {
            source,
            encoding,
            policy: config.retry.policy(),
            documents: parse_selector(&config.selectors.documents)?,
            contexts: parse_selector(&config.selectors.contexts)?,
            pager: parse_selector(&config.selectors.pager)?,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Page at `url` with this client's delay, encoding and retry policy
    pub fn webpage(&self, url: impl Into<String>) -> Webpage {
        Webpage::new(Arc::clone(&self.source), url)
            .delay(self.config.fetch.delay())
            .encoding(self.encoding)
            .retry_policy(self.policy)
    }

    /// Fetch and parse the page at `url`
    pub async fn document(&self, url: &str) -> Result<Html, CorpusError> {
        self.webpage(url).document().await
    }

    /// Number of documents and contexts matching `query`
    pub async fn documents_and_contexts(&self, query: &Query) -> Result<(u64, u64), CorpusError> {
        let url = query.url();
        tracing::debug!("Counting results for {}", url);

        let document = self.document(&url).await?;
        let found = counts(&document, &self.documents, &self.contexts)?;

        tracing::info!(
            "Query matched {} documents and {} contexts",
            found.0,
            found.1
        );
        Ok(found)
    }

    /// Result page number `page` of `query`
    pub async fn result_page(&self, query: &Query, page: u32) -> Result<ResultPage, CorpusError> {
        let document = self.document(&query.page_url(page)).await?;
        let results = ResultPage::parse(&document, &self.pager);

        if results.is_empty() {
            tracing::debug!("No results on page {} of {}", page, query.url());
        }
        Ok(results)
    }

    /// Parse a search URL, decoding legacy escapes with the configured encoding
    pub fn query_from_url(&self, url: &str) -> Result<Query, CorpusError> {
        Ok(Query::from_url_with_encoding(url, self.encoding)?)
    }
}
