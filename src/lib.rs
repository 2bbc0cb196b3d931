//! # RNC Search
//!
//! A client for the web search interface of the Russian National Corpus:
//! build and parse search URLs, fetch result pages politely, and read
//! result counts and source citations out of them.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Query, SourceCitation, etc.)
//! - [`corpus`]: Page fetching and result extraction
//! - [`utils`]: HTTP client, retry with Fibonacci backoff, digit extraction, decoding
//! - [`config`]: Configuration management

pub mod config;
pub mod corpus;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use corpus::{CorpusClient, CorpusError};
pub use models::{Query, SourceCitation, Subcorpus};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
