//! Bibliographic sources attached to corpus results.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

static PARENTHESIZED: OnceLock<Regex> = OnceLock::new();
static YEAR_RANGE: OnceLock<Regex> = OnceLock::new();
static YEAR: OnceLock<Regex> = OnceLock::new();

fn parenthesized() -> &'static Regex {
    PARENTHESIZED.get_or_init(|| Regex::new(r"\([^)]*\)").expect("valid parenthesis pattern"))
}

fn year_range() -> &'static Regex {
    YEAR_RANGE.get_or_init(|| Regex::new(r"([0-9]{4})-([0-9]{4})").expect("valid range pattern"))
}

fn year() -> &'static Regex {
    YEAR.get_or_init(|| Regex::new(r"[0-9]{4}").expect("valid year pattern"))
}

/// One source in corpus search results, with the years parsed out of its name.
///
/// Dates are best effort:
///
/// - a range `1995-1999` gives begin 1995, end 1999 and middle 1997
/// - a reversed range `1999-1995` is put in order, giving the same dates
/// - otherwise the earliest year mentioned is used for all three, since
///   reprints list the original year and the reprint year
/// - a name without any year leaves all three at `0.0`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCitation {
    raw_name: String,
    bare_name: String,
    date_begin: f64,
    date_middle: f64,
    date_end: f64,
}

impl SourceCitation {
    /// Parse a citation as it appears in a result entry.
    pub fn new(raw_name: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        let bare_name = parenthesized().replace_all(&raw_name, "").into_owned();
        let (date_begin, date_middle, date_end) = parse_dates(&raw_name);

        Self {
            raw_name,
            bare_name,
            date_begin,
            date_middle,
            date_end,
        }
    }

    /// The citation exactly as scraped
    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// The citation with parenthesised parts removed
    pub fn bare_name(&self) -> &str {
        &self.bare_name
    }

    pub fn date_begin(&self) -> f64 {
        self.date_begin
    }

    pub fn date_middle(&self) -> f64 {
        self.date_middle
    }

    pub fn date_end(&self) -> f64 {
        self.date_end
    }

    /// Whether any year was found
    pub fn is_dated(&self) -> bool {
        self.date_end > 0.0
    }
}

impl fmt::Display for SourceCitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RNC Source: {}", self.raw_name)
    }
}

fn parse_dates(name: &str) -> (f64, f64, f64) {
    if let Some(caps) = year_range().captures(name) {
        let first: f64 = caps[1].parse().unwrap_or_default();
        let second: f64 = caps[2].parse().unwrap_or_default();
        let (begin, end) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        return (begin, (begin + end) / 2.0, end);
    }

    year()
        .find_iter(name)
        .filter_map(|m| m.as_str().parse::<u32>().ok())
        .min()
        .map(|y| {
            let y = f64::from(y);
            (y, y, y)
        })
        .unwrap_or((0.0, 0.0, 0.0))
}
