//! Character encoding helpers.
//!
//! The corpus serves its pages, and percent-encodes its search terms, in
//! windows-1251. Links we build ourselves use UTF-8.

use encoding_rs::Encoding;

/// Label of the encoding corpus pages are served in
pub const DEFAULT_ENCODING_LABEL: &str = "windows-1251";

/// Encoding corpus pages are served in
pub static DEFAULT_ENCODING: &Encoding = &encoding_rs::WINDOWS_1251_INIT;

/// Look up an encoding by its WHATWG label (e.g. `"windows-1251"`, `"cp1251"`, `"utf-8"`)
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Decode `bytes` with `encoding`, replacing malformed sequences.
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Malformed {} sequences replaced while decoding", encoding.name());
    }
    text.into_owned()
}

/// Decode `bytes` as UTF-8 when they are valid UTF-8, otherwise with `fallback`.
pub fn decode_detected(bytes: &[u8], fallback: &'static Encoding) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => decode(bytes, fallback),
    }
}
