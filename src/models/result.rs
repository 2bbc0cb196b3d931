//! Entries of a corpus result page.

use serde::Serialize;

use super::SourceCitation;

/// One document in a page of search results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultEntry {
    /// Source the matches come from
    pub citation: SourceCitation,
    /// Whole text of the entry, whitespace collapsed
    pub text: String,
}

impl ResultEntry {
    pub fn new(citation: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            citation: SourceCitation::new(citation),
            text: text.into(),
        }
    }
}
