//! Mock page source for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::corpus::{CorpusError, PageSource};

/// A page source that serves predefined pages and scripted failures.
///
/// Queued errors are returned first, one per call, regardless of the URL.
/// Afterwards registered pages are served; unknown URLs answer HTTP 404.
#[derive(Debug, Default)]
pub struct MockPageSource {
    pages: Mutex<HashMap<String, Vec<u8>>>,
    errors: Mutex<VecDeque<CorpusError>>,
    requests: Mutex<Vec<String>>,
}

impl MockPageSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `content` for `url`.
    pub fn set_page(&self, url: impl Into<String>, content: impl Into<Vec<u8>>) {
        let mut guard = self.pages.lock().unwrap();
        guard.insert(url.into(), content.into());
    }

    /// Fail the next call with `error`.
    pub fn push_error(&self, error: CorpusError) {
        let mut guard = self.errors.lock().unwrap();
        guard.push_back(error);
    }

    /// Number of calls to [`PageSource::open`] so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn open(&self, url: &str) -> Result<Vec<u8>, CorpusError> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(error) = self.errors.lock().unwrap().pop_front() {
            return Err(error);
        }

        match self.pages.lock().unwrap().get(url) {
            Some(content) => Ok(content.clone()),
            None => Err(CorpusError::Http(404)),
        }
    }
}
