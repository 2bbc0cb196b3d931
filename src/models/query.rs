//! Search queries against the corpus and their URL form.
//!
//! A query is a base URL plus a mapping of search parameters. Parameter names
//! are kept with underscores (`sem_mod1`) and only turned back into the
//! hyphenated wire form (`sem-mod1`) when the URL is built.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Write};

use crate::utils::{decode_detected, DEFAULT_ENCODING};
use encoding_rs::Encoding;

/// Pagination parameter, never part of a query's identity
pub const PAGE_PARAM: &str = "p";

/// Lexeme search term; the only value percent-encoded on output
const SEARCH_TERM_PARAM: &str = "lex1";

const MAIN_BASE_URL: &str = "http://search.ruscorpora.ru/search.xml";
const BETA_BASE_URL: &str = "http://search-beta.ruscorpora.ru/search.xml";

const OLD_DEFAULTS: &[(&str, &str)] = &[
    ("mode", "old_rus"),
    ("text1", "lexgramm"),
    ("doc_docid", "0|13|2|3|1|4|7|8|10|12|5|11|9|6"),
    ("parent1", "0"),
    ("level1", "0"),
    ("lexi1", ""),
    ("gramm1", ""),
    ("parent2", "0"),
    ("level2", "0"),
    ("min2", "1"),
    ("max2", "1"),
];

const MID_DEFAULTS: &[(&str, &str)] = &[
    ("env", "alpha"),
    ("mode", "mid_rus"),
    ("text", "lexform"),
    ("sort", "gr_created"),
    ("lang", "ru"),
    ("mycorp", ""),
    ("mysent", ""),
    ("mysize", ""),
    ("mysentsize", ""),
    ("mydocsize", ""),
    ("dpp", ""),
    ("spp", ""),
    ("spd", ""),
    ("req", ""),
];

const MAIN_DEFAULTS: &[(&str, &str)] = &[
    ("mycorp", ""),
    ("mysent", ""),
    ("mysize", ""),
    ("dpp", ""),
    ("spp", ""),
    ("spd", ""),
    ("text", "lexgramm"),
    ("mode", "main"),
    ("sort", "gr_tagging"),
    ("lang", "en"),
    ("parent1", "0"),
    ("level1", "0"),
    ("lex1", ""),
    ("gramm1", ""),
    ("sem1", ""),
    ("flags1", ""),
    ("sem-mod1", ""),
    ("sem-mod2", ""),
    ("parent2", "0"),
    ("level2", "0"),
    ("min2", "1"),
    ("max2", "1"),
    ("lex2", ""),
    ("gramm2", ""),
    ("sem2", ""),
    ("flags2", ""),
];

/// Independently indexed partition of the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subcorpus {
    /// Old Russian texts
    Old,
    /// Middle Russian texts
    Mid,
    /// Main (modern) corpus
    Main,
}

impl Subcorpus {
    /// All subcorpora
    pub const ALL: [Subcorpus; 3] = [Subcorpus::Old, Subcorpus::Mid, Subcorpus::Main];

    /// Search endpoint of this subcorpus
    pub fn base_url(self) -> &'static str {
        match self {
            Subcorpus::Old | Subcorpus::Mid => BETA_BASE_URL,
            Subcorpus::Main => MAIN_BASE_URL,
        }
    }

    /// Value of the `mode` parameter selecting this subcorpus
    pub fn mode(self) -> &'static str {
        match self {
            Subcorpus::Old => "old_rus",
            Subcorpus::Mid => "mid_rus",
            Subcorpus::Main => "main",
        }
    }

    /// Default parameters in wire form
    pub fn defaults(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Subcorpus::Old => OLD_DEFAULTS,
            Subcorpus::Mid => MID_DEFAULTS,
            Subcorpus::Main => MAIN_DEFAULTS,
        }
    }

    /// Identify a subcorpus from the value of a `mode` parameter
    pub fn from_mode(mode: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.mode() == mode)
    }
}

impl fmt::Display for Subcorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subcorpus::Old => "old",
            Subcorpus::Mid => "mid",
            Subcorpus::Main => "main",
        };
        f.write_str(name)
    }
}

/// Value of one query parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Text(String),
    /// Present but not yet specified (`key=`)
    Empty,
}

impl ParamValue {
    /// Interpret an unescaped wire value: digits become integers, `""` is empty
    pub fn from_wire(raw: &str) -> Self {
        if raw.is_empty() {
            return ParamValue::Empty;
        }
        if raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = raw.parse() {
                return ParamValue::Integer(n);
            }
        }
        ParamValue::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ParamValue::Empty)
    }

    /// Text content, if this is a text value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ParamValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(n) => write!(f, "{}", n),
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Empty => Ok(()),
        }
    }
}

/// Text follows the wire rules, so `"2"` is stored as `Integer(2)`.
impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::from_wire(s)
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        match ParamValue::from_wire(&s) {
            ParamValue::Text(_) => ParamValue::Text(s),
            value => value,
        }
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Integer(n)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Integer(n.into())
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        ParamValue::Integer(n.into())
    }
}

/// Errors raised while parsing a query URL
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("URL has no query string: {0}")]
    MissingQueryString(String),

    #[error("Malformed query parameter: {0:?}")]
    MalformedParameter(String),

    #[error("Malformed percent-escape in parameter {key}: {value:?}")]
    MalformedEscape { key: String, value: String },
}

/// Normalise a parameter name to its internal (underscore) form
fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Escape the characters that would break `key=value&` framing
fn escape_reserved(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '&' => escaped.push_str("%26"),
            '=' => escaped.push_str("%3D"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Check that every `%` starts a two-digit hex escape
fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3);
            if !hex.is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit)) {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// A search of one subcorpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    base_url: String,
    parameters: BTreeMap<String, ParamValue>,
}

impl Query {
    /// Build a query of `subcorpus` from explicit parameters.
    ///
    /// Parameters missing from `overrides` are filled in from the subcorpus
    /// defaults; explicit values, empty ones included, are never replaced.
    pub fn new<I, K, V>(subcorpus: Subcorpus, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ParamValue>,
    {
        let mut parameters: BTreeMap<String, ParamValue> = overrides
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();

        for (key, value) in subcorpus.defaults() {
            parameters
                .entry(normalize_key(key))
                .or_insert_with(|| ParamValue::from_wire(value));
        }

        Self {
            base_url: subcorpus.base_url().to_string(),
            parameters,
        }
    }

    /// Query of `subcorpus` using only its defaults
    pub fn defaults(subcorpus: Subcorpus) -> Self {
        Self::new(subcorpus, std::iter::empty::<(&str, ParamValue)>())
    }

    /// Reconstruct a query from a search URL.
    ///
    /// Percent-escaped values are decoded as UTF-8 when valid, otherwise as
    /// windows-1251, the encoding the corpus itself uses in its links.
    pub fn from_url(url: &str) -> Result<Self, QueryError> {
        Self::from_url_with_encoding(url, DEFAULT_ENCODING)
    }

    /// Like [`Query::from_url`], decoding non-UTF-8 escapes with `encoding`.
    pub fn from_url_with_encoding(
        url: &str,
        encoding: &'static Encoding,
    ) -> Result<Self, QueryError> {
        let (base_url, query_string) = url
            .split_once('?')
            .ok_or_else(|| QueryError::MissingQueryString(url.to_string()))?;

        let mut parameters = BTreeMap::new();
        for pair in query_string.split('&').filter(|p| !p.is_empty()) {
            let (key, raw) = match pair.split_once('=') {
                Some((key, raw)) if !key.is_empty() => (normalize_key(key), raw),
                _ => return Err(QueryError::MalformedParameter(pair.to_string())),
            };

            let value = if raw.contains('%') {
                if !has_valid_escapes(raw) {
                    return Err(QueryError::MalformedEscape {
                        key,
                        value: raw.to_string(),
                    });
                }
                let bytes = urlencoding::decode_binary(raw.as_bytes());
                ParamValue::from(decode_detected(&bytes, encoding))
            } else {
                ParamValue::from_wire(raw)
            };

            if key != PAGE_PARAM {
                parameters.insert(key, value);
            }
        }

        Ok(Self {
            base_url: base_url.to_string(),
            parameters,
        })
    }

    /// Search endpoint, without the `?`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// All parameters, keyed by their underscore form
    pub fn parameters(&self) -> &BTreeMap<String, ParamValue> {
        &self.parameters
    }

    /// Look up a parameter; hyphenated and underscore names are equivalent
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.parameters.get(&normalize_key(key))
    }

    /// Set a parameter, replacing any previous value
    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.parameters.insert(normalize_key(key), value.into());
    }

    /// Builder-style [`Query::set`]
    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Remove a parameter, returning its value
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.parameters.remove(&normalize_key(key))
    }

    /// Subcorpus selected by the `mode` parameter, if recognised
    pub fn subcorpus(&self) -> Option<Subcorpus> {
        self.get("mode")
            .and_then(ParamValue::as_str)
            .and_then(Subcorpus::from_mode)
    }

    /// Search URL of this query.
    ///
    /// Every parameter is emitted as `key=value&`. The search term is fully
    /// percent-encoded (as UTF-8); other values only have `%`, `&` and `=`
    /// escaped. Parameter order is not significant.
    pub fn url(&self) -> String {
        let mut address = format!("{}?", self.base_url);
        for (key, value) in &self.parameters {
            let key = key.replace('_', "-");
            let value = value.to_string();
            if key == SEARCH_TERM_PARAM {
                let _ = write!(address, "{}={}&", key, urlencoding::encode(&value));
            } else {
                let _ = write!(address, "{}={}&", key, escape_reserved(&value));
            }
        }
        address
    }

    /// URL of result page `page` of this query
    pub fn page_url(&self, page: u32) -> String {
        format!("{}{}={}&", self.url(), PAGE_PARAM, page)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split a query URL into its `key=value` segments
    fn segments(url: &str) -> Vec<String> {
        let (_, query) = url.split_once('?').unwrap();
        query
            .split('&')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_explicit_parameters_win_over_defaults() {
        let query = Query::new(Subcorpus::Main, [("lang", "ru")]);
        assert_eq!(query.get("lang"), Some(&ParamValue::Text("ru".to_string())));

        let query = Query::defaults(Subcorpus::Main);
        assert_eq!(query.get("lang"), Some(&ParamValue::Text("en".to_string())));
    }

    #[test]
    fn test_explicit_empty_value_is_kept() {
        let query = Query::new(Subcorpus::Main, [("sort", "")]);
        assert_eq!(query.get("sort"), Some(&ParamValue::Empty));
        assert!(segments(&query.url()).contains(&"sort=".to_string()));
    }

    #[test]
    fn test_subcorpus_defaults_and_endpoints() {
        let old = Query::defaults(Subcorpus::Old);
        assert_eq!(old.base_url(), BETA_BASE_URL);
        assert_eq!(old.subcorpus(), Some(Subcorpus::Old));
        assert_eq!(old.get("min2"), Some(&ParamValue::Integer(1)));
        assert_eq!(old.parameters().len(), OLD_DEFAULTS.len());

        let mid = Query::defaults(Subcorpus::Mid);
        assert_eq!(mid.base_url(), BETA_BASE_URL);
        assert_eq!(mid.subcorpus(), Some(Subcorpus::Mid));
        assert_eq!(mid.get("env"), Some(&ParamValue::Text("alpha".to_string())));

        let main = Query::defaults(Subcorpus::Main);
        assert_eq!(main.base_url(), MAIN_BASE_URL);
        assert_eq!(main.subcorpus(), Some(Subcorpus::Main));
        assert_eq!(main.get("parent1"), Some(&ParamValue::Integer(0)));
    }

    #[test]
    fn test_hyphenated_names_normalised() {
        let query = Query::new(Subcorpus::Main, [("sem-mod1", "sem")]);
        assert_eq!(query.get("sem_mod1"), Some(&ParamValue::Text("sem".to_string())));
        assert!(query.parameters().contains_key("sem_mod2"));
        assert!(!query.parameters().keys().any(|k| k.contains('-')));

        let segs = segments(&query.url());
        assert!(segs.contains(&"sem-mod1=sem".to_string()));
        assert!(segs.contains(&"sem-mod2=".to_string()));
        assert!(!segs.iter().any(|s| s.starts_with("sem_mod")));
    }

    #[test]
    fn test_url_layout() {
        let query = Query::new(Subcorpus::Main, [("lex1", "читать")]);
        let url = query.url();

        assert!(url.starts_with("http://search.ruscorpora.ru/search.xml?"));
        assert!(url.ends_with('&'));
        assert_eq!(segments(&url).len(), MAIN_DEFAULTS.len());
        assert!(segments(&url).contains(&"mode=main".to_string()));
        assert!(segments(&url).contains(&"min2=1".to_string()));
    }

    #[test]
    fn test_search_term_is_utf8_percent_encoded() {
        let query = Query::new(Subcorpus::Main, [("lex1", "читать")]);
        assert!(segments(&query.url())
            .contains(&"lex1=%D1%87%D0%B8%D1%82%D0%B0%D1%82%D1%8C".to_string()));
    }

    #[test]
    fn test_round_trip() {
        let original = Query::new(
            Subcorpus::Main,
            [
                ("lex1", ParamValue::from("учитать")),
                ("lang", ParamValue::from("ru")),
                ("sem-mod1", ParamValue::from("sem")),
                ("level1", ParamValue::from(2)),
            ],
        );

        let parsed = Query::from_url(&original.page_url(3)).unwrap();

        assert_eq!(parsed.parameters(), original.parameters());
        assert_eq!(parsed.base_url(), original.base_url());
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_round_trip_awkward_values() {
        let original = Query::new(
            Subcorpus::Main,
            [
                ("level1", "2"),
                ("gramm1", "50%"),
                ("flags1", "S&V"),
                ("sem1", "a=b"),
                ("lex2", "%D1%87"),
                ("lex1", "100% да"),
            ],
        );
        assert_eq!(original.get("level1"), Some(&ParamValue::Integer(2)));

        let url = original.url();
        assert!(segments(&url).contains(&"gramm1=50%25".to_string()));
        assert!(segments(&url).contains(&"flags1=S%26V".to_string()));
        assert!(segments(&url).contains(&"sem1=a%3Db".to_string()));

        let parsed = Query::from_url(&url).unwrap();
        assert_eq!(parsed.parameters(), original.parameters());
        assert_eq!(
            parsed.get("lex2"),
            Some(&ParamValue::Text("%D1%87".to_string()))
        );
    }

    #[test]
    fn test_text_values_follow_wire_rules() {
        assert_eq!(ParamValue::from("2"), ParamValue::Integer(2));
        assert_eq!(ParamValue::from(String::from("007")), ParamValue::Integer(7));
        assert_eq!(ParamValue::from(""), ParamValue::Empty);
        assert_eq!(ParamValue::from(String::from("ru")), ParamValue::Text("ru".to_string()));
    }

    #[test]
    fn test_round_trip_every_subcorpus() {
        for subcorpus in Subcorpus::ALL {
            let original = Query::defaults(subcorpus);
            let parsed = Query::from_url(&original.url()).unwrap();
            assert_eq!(parsed, original, "round trip failed for {}", subcorpus);
        }
    }

    #[test]
    fn test_parse_corpus_link() {
        let url = "http://search.ruscorpora.ru/search.xml?mycorp=&text=lexgramm&mode=main&\
                   sort=gr_tagging&lang=en&parent1=0&level1=0&lex1=%F3%F7%E8%F2%E0%F2%FC&\
                   sem-mod1=sem&sem-mod1=sem2&min2=1&p=4";
        let query = Query::from_url(url).unwrap();

        assert_eq!(query.base_url(), MAIN_BASE_URL);
        assert_eq!(query.get("lex1"), Some(&ParamValue::Text("учитать".to_string())));
        assert_eq!(query.get("sem_mod1"), Some(&ParamValue::Text("sem2".to_string())));
        assert_eq!(query.get("parent1"), Some(&ParamValue::Integer(0)));
        assert_eq!(query.get("mycorp"), Some(&ParamValue::Empty));
        assert_eq!(query.get(PAGE_PARAM), None);
        assert_eq!(query.subcorpus(), Some(Subcorpus::Main));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Query::from_url("http://search.ruscorpora.ru/search.xml"),
            Err(QueryError::MissingQueryString(
                "http://search.ruscorpora.ru/search.xml".to_string()
            ))
        );
        assert_eq!(
            Query::from_url("http://example.com/?mode=main&lonely"),
            Err(QueryError::MalformedParameter("lonely".to_string()))
        );
        assert_eq!(
            Query::from_url("http://example.com/?=x"),
            Err(QueryError::MalformedParameter("=x".to_string()))
        );
        assert_eq!(
            Query::from_url("http://example.com/?lex1=%F3%G7"),
            Err(QueryError::MalformedEscape {
                key: "lex1".to_string(),
                value: "%F3%G7".to_string(),
            })
        );
        assert!(matches!(
            Query::from_url("http://example.com/?lex1=abc%"),
            Err(QueryError::MalformedEscape { .. })
        ));
    }

    #[test]
    fn test_set_and_remove() {
        let mut query = Query::defaults(Subcorpus::Mid);
        query.set("sem-mod1", "sem");
        assert_eq!(query.get("sem_mod1").and_then(ParamValue::as_str), Some("sem"));
        assert_eq!(query.remove("req"), Some(ParamValue::Empty));
        assert!(query.get("req").is_none());

        let query = query.with("mode", "main");
        assert_eq!(query.subcorpus(), Some(Subcorpus::Main));
    }

    #[test]
    fn test_page_url() {
        let query = Query::defaults(Subcorpus::Old);
        let url = query.page_url(2);
        assert!(url.starts_with(&query.url()));
        assert!(url.ends_with("p=2&"));
    }

    #[test]
    fn test_param_value_wire_forms() {
        assert_eq!(ParamValue::from_wire("12"), ParamValue::Integer(12));
        assert_eq!(ParamValue::from_wire(""), ParamValue::Empty);
        assert_eq!(
            ParamValue::from_wire("0|13|2"),
            ParamValue::Text("0|13|2".to_string())
        );
        assert_eq!(ParamValue::Integer(7).to_string(), "7");
        assert_eq!(ParamValue::Empty.to_string(), "");
    }
}
