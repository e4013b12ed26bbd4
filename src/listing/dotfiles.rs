//! Dotfile visibility policy

/// Name of the synthetic parent entry; never subject to filtering
pub const PARENT_ENTRY: &str = "..";

/// True when any segment of the logical path starts with `.`
pub fn has_dot_segment(logical: &str) -> bool {
    logical.split('/').any(|segment| segment.starts_with('.'))
}

/// Whether a request for `logical` may reach the filesystem at all
pub fn path_visible(hide_dotfiles: bool, logical: &str) -> bool {
    !(hide_dotfiles && has_dot_segment(logical))
}

/// Whether a directory entry read from disk shows up in a listing
pub fn entry_visible(hide_dotfiles: bool, name: &str) -> bool {
    !(hide_dotfiles && name.starts_with('.'))
}
