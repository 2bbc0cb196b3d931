//! Utility modules supporting corpus access.
//!
//! - [`digits_only`] / [`to_integer`]: normalise scraped counts such as `"14 311"`
//! - [`HttpClient`]: reqwest-backed [`PageSource`](crate::corpus::PageSource)
//! - [`RetryPolicy`] / [`fetch_with_retry`]: retry loop with Fibonacci backoff
//! - [`decode`] / [`decode_detected`]: page and parameter decoding (windows-1251 by default)
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use rnc_search::utils::{fetch_with_retry, HttpClient, RetryPolicy};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let policy = RetryPolicy::default().max_attempts(5);
//! let bytes = fetch_with_retry(
//!     &client,
//!     "http://search.ruscorpora.ru/search.xml?lex1=%D1%87%D0%B8%D1%82%D0%B0%D1%82%D1%8C&",
//!     Duration::from_secs(1),
//!     policy,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

mod digits;
mod encoding;
mod http;
mod retry;

#[allow(deprecated)]
pub use digits::to_integer_or_zero;
pub use digits::{digits_only, to_integer, DigitsError};
pub use encoding::{
    decode, decode_detected, encoding_for_label, DEFAULT_ENCODING, DEFAULT_ENCODING_LABEL,
};
pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use retry::{fetch_with_retry, fibonacci_number, Backoff, PageFetchState, RetryPolicy};
