//! Retry loop with Fibonacci backoff for fetching corpus pages.
//!
//! The corpus throttles scrapers by failing requests outright, so every
//! transient failure is answered with a growing pause before the next attempt:
//! 1, 1, 2, 3, 5, 8, 13, ... backoff units.

use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::corpus::{CorpusError, PageSource};

/// Return the `n`th number of the Fibonacci series (1-based).
///
/// `fibonacci_number(1) == fibonacci_number(2) == 1`; values saturate at `u64::MAX`.
pub fn fibonacci_number(n: u32) -> u64 {
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 1..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}

/// Schedule of pauses between failed attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Sleep `fibonacci_number(attempt)` units after the given failed attempt
    Fibonacci { unit: Duration },
    /// Sleep the same amount after every failed attempt
    Fixed(Duration),
}

impl Backoff {
    /// Pause to apply after failed attempt number `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Fibonacci { unit } => {
                let factor = u32::try_from(fibonacci_number(attempt)).unwrap_or(u32::MAX);
                unit.checked_mul(factor).unwrap_or(Duration::MAX)
            }
            Backoff::Fixed(delay) => *delay,
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff::Fibonacci {
            unit: Duration::from_secs(1),
        }
    }
}

/// Limits on how long a single page fetch may keep retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (`None` = no limit)
    pub max_attempts: Option<u32>,
    /// Maximum time spent on one fetch, including delays (`None` = no limit)
    pub max_elapsed: Option<Duration>,
    /// Pause schedule between attempts
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(8),
            max_elapsed: Some(Duration::from_secs(600)),
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    /// Retry forever until the page loads.
    ///
    /// A throttled run can block the caller indefinitely with this policy.
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            max_elapsed: None,
            backoff: Backoff::default(),
        }
    }

    /// Set the maximum number of attempts
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the maximum total time
    pub fn max_elapsed(mut self, elapsed: Duration) -> Self {
        self.max_elapsed = Some(elapsed);
        self
    }

    /// Set the backoff schedule
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether to stop after `attempts` failures, given the time that would
    /// have elapsed once the next backoff is over.
    fn is_exhausted(&self, attempts: u32, projected: Duration) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.max_elapsed.is_some_and(|max| projected > max)
    }
}

/// Per-call state of one page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetchState {
    /// Address being fetched
    pub address: String,
    /// Politeness delay applied before every attempt
    pub delay: Duration,
    /// Current attempt number, starting at 1
    pub attempt_count: u32,
}

impl PageFetchState {
    /// Start a fresh fetch of `address`
    pub fn new(address: impl Into<String>, delay: Duration) -> Self {
        Self {
            address: address.into(),
            delay,
            attempt_count: 1,
        }
    }

    /// Move on to the next attempt after a failure
    pub fn record_failure(&mut self) {
        self.attempt_count += 1;
    }
}

/// Fetch `address` from `source`, retrying transient failures under `policy`.
///
/// Sleeps `delay` before every attempt. Permanent errors are returned as is;
/// running out of attempts or time yields [`CorpusError::RetriesExhausted`].
pub async fn fetch_with_retry<S>(
    source: &S,
    address: &str,
    delay: Duration,
    policy: RetryPolicy,
) -> Result<Vec<u8>, CorpusError>
where
    S: PageSource + ?Sized,
{
    let mut state = PageFetchState::new(address, delay);
    let started = Instant::now();

    loop {
        if !state.delay.is_zero() {
            sleep(state.delay).await;
        }

        tracing::debug!(address, attempt = state.attempt_count, "Fetching page");

        match source.open(address).await {
            Ok(content) => {
                if state.attempt_count > 1 {
                    tracing::info!(
                        "Loaded {} on attempt {} after {} transient failures",
                        address,
                        state.attempt_count,
                        state.attempt_count - 1
                    );
                }
                return Ok(content);
            }
            Err(error) if error.is_transient() => {
                let pause = policy.backoff.delay(state.attempt_count);

                if policy.is_exhausted(state.attempt_count, started.elapsed() + pause) {
                    tracing::warn!(
                        "Giving up on {} after {} attempts (elapsed: {:?}): {}",
                        address,
                        state.attempt_count,
                        started.elapsed(),
                        error
                    );
                    return Err(CorpusError::RetriesExhausted {
                        address: state.address,
                        attempts: state.attempt_count,
                        last_error: Box::new(error),
                    });
                }

                tracing::warn!(
                    "Attempt {} for {} failed: {}; retrying in {:?}",
                    state.attempt_count,
                    address,
                    error,
                    pause
                );

                sleep(pause).await;
                state.record_failure();
            }
            Err(error) => return Err(error),
        }
    }
}
