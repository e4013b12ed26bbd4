//! Directory listing renderer
//!
//! Reads entries, applies the dotfile policy and renders the HTML listing.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

use super::dotfiles::{entry_visible, PARENT_ENTRY};
use super::template;
use crate::http::response::escape_html;

/// Characters left as-is in generated hrefs: unreserved plus `/`
const HREF_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    /// Percent-encoded absolute URL path of the entry
    pub href: String,
}

impl DirectoryEntry {
    pub fn new(logical: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            href: entry_href(logical, name),
        }
    }
}

/// `logical` with exactly one trailing `/`, then `name`, percent-encoded
pub fn entry_href(logical: &str, name: &str) -> String {
    let joined = format!("{}/{}", logical.trim_end_matches('/'), name);
    utf8_percent_encode(&joined, HREF_ENCODE).to_string()
}

/// `..` first, then `names` in the given order minus hidden ones
pub fn build_entries<I>(logical: &str, names: I, hide_dotfiles: bool) -> Vec<DirectoryEntry>
where
    I: IntoIterator<Item = String>,
{
    std::iter::once(DirectoryEntry::new(logical, PARENT_ENTRY))
        .chain(
            names
                .into_iter()
                .filter(|name| entry_visible(hide_dotfiles, name))
                .map(|name| DirectoryEntry::new(logical, &name)),
        )
        .collect()
}

/// Read `fs_path` and build its entries; `None` if the read fails at any point.
///
/// Names that are not valid UTF-8 are left out: request paths must decode to
/// UTF-8, so no href could reach them.
pub async fn read_entries(
    fs_path: &Path,
    logical: &str,
    hide_dotfiles: bool,
) -> Option<Vec<DirectoryEntry>> {
    let mut dir = fs::read_dir(fs_path).await.ok()?;
    let mut names = Vec::new();
    while let Some(entry) = dir.next_entry().await.ok()? {
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Some(build_entries(logical, names, hide_dotfiles))
}

/// Render the listing page. Pure: equal inputs give byte-identical output.
pub fn render_listing(template_text: &str, logical: &str, entries: &[DirectoryEntry]) -> String {
    let list: String = entries
        .iter()
        .map(|entry| {
            format!(
                "<li><a href=\"{}\">{}</a></li>",
                escape_html(&entry.href),
                escape_html(&entry.name)
            )
        })
        .collect();

    let mut bindings = HashMap::with_capacity(2);
    bindings.insert("path", escape_html(logical));
    bindings.insert("list", list);
    template::render(template_text, &bindings)
}
