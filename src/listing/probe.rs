//! Filesystem probe: one stat, three outcomes

use std::fs::Metadata;
use std::path::Path;
use tokio::fs;

/// What a resolved path points at
#[derive(Debug)]
pub enum Probe {
    Directory(Metadata),
    File(Metadata),
    /// Missing, unreadable, or anything else `stat` refused; not distinguished
    Absent,
}

/// Stat `path` (following symlinks) exactly once
pub async fn probe(path: &Path) -> Probe {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Probe::Directory(meta),
        Ok(meta) => Probe::File(meta),
        Err(_) => Probe::Absent,
    }
}
