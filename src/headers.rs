//! Carrying a payload in HTTP response headers.
//!
//! The payload is encoded one-way with a depth limit, base64-encoded with the
//! standard alphabet, and cut into chunks of at most
//! [`HeaderOptions::line_width`] characters. Each chunk becomes one header:
//!
//! ```text
//! FireLogger-1a2b3c4d-0: eyJsb2dzIjpbeyJsZXZlbCI6ImluZm8iLCJtZXNzYWdlIjoi...
//! FireLogger-1a2b3c4d-1: ...
//! ```
//!
//! The 8-digit hex guid ties the chunks of one payload together, so payloads
//! republished from nested applications can travel in the same response.
//!
//! ```rust
//! use firepickle::headers::{decode_headers, encode_headers};
//! use firepickle::record::Payload;
//! use firepickle::{value, HeaderOptions};
//!
//! let mut payload = Payload::new();
//! payload.logs.push(value!({"level": "info", "message": "hello"}));
//!
//! let headers = encode_headers(&payload, &HeaderOptions::new());
//! assert!(headers.iter().all(|(name, _)| name.starts_with("FireLogger-")));
//!
//! let decoded = decode_headers(headers).unwrap();
//! assert_eq!(decoded, vec![value!({"logs": [{"level": "info", "message": "hello"}]})]);
//! ```

use crate::record::Payload;
use crate::{buffer, decode, Error, HeaderOptions, RecordOptions, Result, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

const DEFAULT_PREFIX: &str = "FireLogger";

/// A fresh payload id: 8 lowercase hex digits.
#[must_use]
pub fn new_guid() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// Splits a header name of the form `<prefix>-<guid>-<index>`.
///
/// The prefix is matched case-insensitively, since header names are.
///
/// # Examples
///
/// ```rust
/// use firepickle::headers::parse_header_name;
///
/// assert_eq!(
///     parse_header_name("firelogger-0badf00d-3", "FireLogger"),
///     Some(("0badf00d", 3))
/// );
/// assert_eq!(parse_header_name("FireLogger-xyz-3", "FireLogger"), None);
/// ```
#[must_use]
pub fn parse_header_name<'a>(name: &'a str, prefix: &str) -> Option<(&'a str, usize)> {
    let head = name.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = name.get(prefix.len()..)?.strip_prefix('-')?;
    let (guid, index) = rest.split_once('-')?;
    if guid.len() != 8 || !guid.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((guid, index.parse().ok()?))
}

/// Whether a header carries a FireLogger payload chunk.
#[must_use]
pub fn is_firelogger_header(name: &str) -> bool {
    parse_header_name(name, DEFAULT_PREFIX).is_some()
}

/// Encodes JSON text into numbered header chunks under the given guid.
#[must_use]
pub fn chunk_headers(json: &str, guid: &str, options: &HeaderOptions) -> Vec<(String, String)> {
    let encoded = STANDARD.encode(json.as_bytes());
    encoded
        .as_bytes()
        .chunks(options.line_width.max(1))
        .enumerate()
        .map(|(index, chunk)| {
            (
                format!("{}-{}-{}", options.prefix, guid, index),
                // base64 output is ASCII
                String::from_utf8_lossy(chunk).into_owned(),
            )
        })
        .collect()
}

/// Encodes a payload into response headers under a fresh guid.
#[must_use]
pub fn encode_headers(payload: &Payload, options: &HeaderOptions) -> Vec<(String, String)> {
    let json = payload.encode(options.pickle_options());
    chunk_headers(&json, &new_guid(), options)
}

/// Drains the current thread's buffer into response headers.
///
/// Headers queued with [`buffer::republish`] come first, followed by the
/// chunks of this thread's own payload.
#[must_use]
pub fn flush(
    profile: Option<Value>,
    options: &HeaderOptions,
    record_options: &RecordOptions,
) -> Vec<(String, String)> {
    let mut headers = buffer::take_republished();
    let records = buffer::take_records();
    debug!(records = records.len(), "flushing log records");

    let mut payload = Payload::from_records(&records, record_options);
    payload.profile = profile;
    headers.extend(encode_headers(&payload, options));
    headers
}

/// Reassembles and decodes every payload found in `headers`.
///
/// Headers that are not FireLogger chunks are ignored. Payloads are returned
/// in the order their guid first appears; chunks may arrive in any order.
///
/// # Errors
///
/// Fails if a payload has a gap in its chunk indices, or if its data is not
/// base64, UTF-8 or JSON.
pub fn decode_headers<I, K, V>(headers: I) -> Result<Vec<Value>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    decode_headers_with_options(headers, &HeaderOptions::default())
}

/// Like [`decode_headers`], for chunks named with `options.prefix`.
///
/// # Examples
///
/// ```rust
/// use firepickle::headers::{decode_headers_with_options, encode_headers};
/// use firepickle::record::Payload;
/// use firepickle::HeaderOptions;
///
/// let options = HeaderOptions::new().with_prefix("X-Log");
/// let headers = encode_headers(&Payload::new(), &options);
/// assert!(headers[0].0.starts_with("X-Log-"));
/// assert_eq!(decode_headers_with_options(headers, &options).unwrap().len(), 1);
/// ```
///
/// # Errors
///
/// As [`decode_headers`].
pub fn decode_headers_with_options<I, K, V>(
    headers: I,
    options: &HeaderOptions,
) -> Result<Vec<Value>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut payloads: IndexMap<String, BTreeMap<usize, String>> = IndexMap::new();
    for (name, value) in headers {
        let Some((guid, index)) = parse_header_name(name.as_ref(), &options.prefix) else {
            continue;
        };
        payloads
            .entry(guid.to_ascii_lowercase())
            .or_default()
            .insert(index, value.as_ref().trim().to_string());
    }

    payloads
        .into_iter()
        .map(|(guid, chunks)| {
            let mut encoded = String::new();
            for (expected, (index, chunk)) in chunks.into_iter().enumerate() {
                if index != expected {
                    return Err(Error::missing_chunk(&guid, expected));
                }
                encoded.push_str(&chunk);
            }
            let json = String::from_utf8(STANDARD.decode(encoded)?)?;
            decode(&json)
        })
        .collect()
}
