//! Digit extraction for counts scraped from result pages.
//!
//! The corpus renders large numbers with spaces as thousands separators
//! (`14 311`), so counts are normalised by dropping every non-digit first.

/// Errors raised when converting scraped text into an integer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigitsError {
    /// The input contained no ASCII digits at all
    #[error("no digits present in {0:?}")]
    NoDigits(String),

    /// The digits do not fit into a `u64`
    #[error("number out of range: {0}")]
    OutOfRange(String),
}

/// Keep only the ASCII digits of `s`, in order.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Parse the digits of `s` as an integer.
///
/// Fails with [`DigitsError::NoDigits`] when `s` has no digits, so callers
/// that want a fallback value have to ask for it explicitly.
pub fn to_integer(s: &str) -> Result<u64, DigitsError> {
    let digits = digits_only(s);
    if digits.is_empty() {
        return Err(DigitsError::NoDigits(s.to_string()));
    }

    digits
        .parse::<u64>()
        .map_err(|_| DigitsError::OutOfRange(digits))
}

/// Legacy permissive conversion: text without digits becomes `0`.
#[deprecated(note = "use `to_integer` and handle `DigitsError::NoDigits` explicitly")]
pub fn to_integer_or_zero(s: &str) -> u64 {
    match to_integer(s) {
        Ok(n) => n,
        Err(DigitsError::NoDigits(_)) => 0,
        Err(DigitsError::OutOfRange(_)) => u64::MAX,
    }
}
