//! HTTP cache control module
//!
//! Provides stat-based `ETag`/`Last-Modified` validators and conditional request handling.

use chrono::{DateTime, Utc};
use hyper::header::{self, HeaderMap, HeaderValue};
use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::ListingPolicy;

/// IMF-fixdate, the preferred HTTP-date format
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Validators computed from a stat result, each present only when enabled by policy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    /// Modification time in whole seconds since the epoch
    modified_secs: Option<i64>,
}

impl Validators {
    pub fn from_metadata(meta: &Metadata, policy: &ListingPolicy) -> Self {
        let modified = meta.modified().ok();
        Self::new(meta.len(), modified, policy)
    }

    pub fn new(len: u64, modified: Option<SystemTime>, policy: &ListingPolicy) -> Self {
        let modified_secs = modified.map(|t| DateTime::<Utc>::from(t).timestamp());
        Self {
            etag: policy.etag.then(|| generate_etag(len, modified)),
            last_modified: if policy.last_modified {
                modified.map(format_http_date)
            } else {
                None
            },
            modified_secs: if policy.last_modified { modified_secs } else { None },
        }
    }
}

/// Conditional headers sent by the client
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidators<'a> {
    pub if_none_match: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

/// Generate a weak `ETag` from size and modification time
///
/// # Returns
/// Weak `ETag` string, e.g., `W/"1a2b-18c3f0a9e21"`
pub fn generate_etag(len: u64, modified: Option<SystemTime>) -> String {
    let mtime_ms = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis());
    format!("W/\"{len:x}-{mtime_ms:x}\"")
}

/// Format a timestamp as an HTTP-date
pub fn format_http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP-date into seconds since the epoch
pub fn parse_http_date(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.timestamp())
}

/// Check if client's `If-None-Match` header matches the server's `ETag`
///
/// Supports:
/// - Single `ETag`: `"abc123"`
/// - Multiple `ETags`: `"abc123", "def456"`
/// - Wildcard: `*`
///
/// Comparison is weak: a `W/` prefix on either side is ignored.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    let ours = strip_weak(etag);
    if_none_match.is_some_and(|client_etag| {
        client_etag
            .split(',')
            .map(str::trim)
            .any(|e| e == "*" || strip_weak(e) == ours)
    })
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// True when the resource has not changed since `If-Modified-Since`
pub fn check_not_modified(if_modified_since: Option<&str>, modified_secs: i64) -> bool {
    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since| modified_secs <= since)
}

/// Decide whether the client's cached copy may be reused.
///
/// Fresh when either enabled check passes: the `ETag` matches `If-None-Match`,
/// or the resource is unmodified since `If-Modified-Since`. A validator the
/// policy disabled is never consulted.
pub fn is_fresh(request: &RequestValidators<'_>, validators: &Validators) -> bool {
    let etag_match = validators
        .etag
        .as_deref()
        .is_some_and(|etag| check_etag_match(request.if_none_match, etag));
    let not_modified = validators
        .modified_secs
        .is_some_and(|modified| check_not_modified(request.if_modified_since, modified));
    etag_match || not_modified
}

/// `Cache-Control` value for a policy, `None` when the header is disabled
pub fn cache_control_value(policy: &ListingPolicy) -> Option<String> {
    if !policy.cache_control {
        return None;
    }
    let mut value = format!("public, max-age={}", policy.max_age);
    if policy.immutable {
        value.push_str(", immutable");
    }
    Some(value)
}

/// `ETag`, `Last-Modified` and `Cache-Control` headers as enabled by policy
pub fn cache_headers(validators: &Validators, policy: &ListingPolicy) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let values = [
        (header::ETAG, validators.etag.clone()),
        (header::LAST_MODIFIED, validators.last_modified.clone()),
        (header::CACHE_CONTROL, cache_control_value(policy)),
    ];
    for (name, value) in values {
        if let Some(value) = value.and_then(|v| HeaderValue::from_str(&v).ok()) {
            headers.insert(name, value);
        }
    }
    headers
}
