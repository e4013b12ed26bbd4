//! Request path normalization
//!
//! Turns a raw request target into a logical URL path and a filesystem path
//! that can never leave the served root.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// A request target resolved against the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Decoded, collapsed URL path; starts with `/`, keeps a trailing `/` if one was sent
    pub logical: String,
    /// `root` joined with the cleaned segments
    pub fs_path: PathBuf,
}

impl ResolvedPath {
    pub fn has_trailing_slash(&self) -> bool {
        self.logical.ends_with('/')
    }
}

/// Normalize `raw_target` (path plus optional query/fragment) against `root`.
///
/// Returns `None` for undecodable input, embedded NUL bytes, and `..`
/// segments that would climb above the root.
pub fn normalize(raw_target: &str, root: &Path) -> Option<ResolvedPath> {
    let path = raw_target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    if decoded.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            name => segments.push(name),
        }
    }

    let mut logical = String::with_capacity(decoded.len() + 1);
    logical.push('/');
    logical.push_str(&segments.join("/"));
    if !segments.is_empty() && decoded.ends_with('/') {
        logical.push('/');
    }

    let fs_path = segments
        .iter()
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment));

    Some(ResolvedPath { logical, fs_path })
}
