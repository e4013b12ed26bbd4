//! Response header hook
//!
//! Lets the embedding configuration adjust headers of file and listing
//! responses right before they are finalized.

use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::Path;

/// Called with the response headers, the filesystem path being served and its metadata
pub trait SetHeaders: Send + Sync {
    fn set_headers(&self, headers: &mut HeaderMap, path: &Path, metadata: &Metadata);
}

/// Fixed headers from the `[serve.headers]` table
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl StaticHeaders {
    /// Validate names and values; the error names the offending header
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, String> {
        let headers = map
            .iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| format!("header name '{name}': {e}"))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| format!("header '{name}' value: {e}"))?;
                Ok((name, value))
            })
            .collect::<Result<Vec<_>, String>>()?;
        Ok(Self { headers })
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}

impl SetHeaders for StaticHeaders {
    fn set_headers(&self, headers: &mut HeaderMap, _path: &Path, _metadata: &Metadata) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}
