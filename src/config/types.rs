// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One year, the ceiling applied to `max_age`
pub const MAX_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Listen backlog passed to `listen(2)`
    pub backlog: i32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
}

/// What to do with paths and entries whose name starts with `.`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DotfilesMode {
    #[default]
    Allow,
    /// Files answer 403, listings hide the entries
    Deny,
    /// Files answer 404, listings hide the entries
    Ignore,
}

impl DotfilesMode {
    pub const fn hides(self) -> bool {
        matches!(self, Self::Deny | Self::Ignore)
    }
}

impl std::fmt::Display for DotfilesMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
            Self::Ignore => "ignore",
        })
    }
}

/// `maxAge` as written by the user: milliseconds or a duration string
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum MaxAgeInput {
    Millis(f64),
    Text(String),
}

impl Default for MaxAgeInput {
    fn default() -> Self {
        Self::Millis(0.0)
    }
}

impl MaxAgeInput {
    /// Resolve to whole seconds, clamped to `[0, MAX_MAX_AGE_SECS]`.
    ///
    /// Negative, NaN and unparseable inputs resolve to 0.
    pub fn to_secs(&self) -> u64 {
        let millis = match self {
            Self::Millis(ms) => *ms,
            Self::Text(text) => parse_duration_millis(text.trim()).unwrap_or(0.0),
        };
        if millis.is_nan() || millis <= 0.0 {
            return 0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ceiling = (MAX_MAX_AGE_SECS * 1000) as f64;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let secs = (millis.min(ceiling) / 1000.0).floor() as u64;
        secs
    }
}

/// Bare numbers are milliseconds; anything else goes through `humantime`
fn parse_duration_millis(text: &str) -> Option<f64> {
    if let Ok(ms) = text.parse::<f64>() {
        return Some(ms);
    }
    #[allow(clippy::cast_precision_loss)]
    humantime::parse_duration(text)
        .ok()
        .map(|d| d.as_millis() as f64)
}

/// `index` setting: `false`, a single file name, or a list
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum IndexSetting {
    Enabled(bool),
    One(String),
    Many(Vec<String>),
}

impl Default for IndexSetting {
    fn default() -> Self {
        Self::Many(vec!["index.html".to_string()])
    }
}

impl IndexSetting {
    pub fn files(&self) -> Vec<String> {
        match self {
            Self::Enabled(true) => vec!["index.html".to_string()],
            Self::Enabled(false) => Vec::new(),
            Self::One(name) => vec![name.clone()],
            Self::Many(names) => names.clone(),
        }
    }
}

/// `extensions` setting: `false` or a list of fallback extensions
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum ExtensionsSetting {
    Enabled(bool),
    List(Vec<String>),
}

impl Default for ExtensionsSetting {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

impl ExtensionsSetting {
    pub fn list(&self) -> Vec<String> {
        match self {
            Self::Enabled(_) => Vec::new(),
            Self::List(exts) => exts
                .iter()
                .map(|e| e.trim_start_matches('.').to_string())
                .collect(),
        }
    }
}

/// Static serving and directory listing configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServeConfig {
    pub root: PathBuf,
    pub listing: bool,
    /// Alternative listing template, read once at startup
    pub template: Option<PathBuf>,
    /// Extra headers applied to every file and listing response
    pub headers: BTreeMap<String, String>,
    pub dotfiles: DotfilesMode,
    pub etag: bool,
    pub last_modified: bool,
    pub cache_control: bool,
    pub max_age: MaxAgeInput,
    pub immutable: bool,
    pub accept_ranges: bool,
    pub index: IndexSetting,
    pub redirect: bool,
    pub extensions: ExtensionsSetting,
    pub fallthrough: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            listing: true,
            template: None,
            headers: BTreeMap::new(),
            dotfiles: DotfilesMode::Allow,
            etag: true,
            last_modified: true,
            cache_control: true,
            max_age: MaxAgeInput::default(),
            immutable: false,
            accept_ranges: true,
            index: IndexSetting::default(),
            redirect: true,
            extensions: ExtensionsSetting::default(),
            fallthrough: true,
        }
    }
}

/// Read-only cache and visibility policy shared by file and listing responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPolicy {
    pub hide_dotfiles: bool,
    pub etag: bool,
    pub last_modified: bool,
    pub cache_control: bool,
    pub max_age: u64,
    pub immutable: bool,
}

impl ListingPolicy {
    pub fn from_serve(serve: &ServeConfig) -> Self {
        Self {
            hide_dotfiles: serve.dotfiles.hides(),
            etag: serve.etag,
            last_modified: serve.last_modified,
            cache_control: serve.cache_control,
            max_age: serve.max_age.to_secs(),
            immutable: serve.immutable,
        }
    }
}

/// Options only the static file server cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    pub dotfiles: DotfilesMode,
    pub index: Vec<String>,
    pub redirect: bool,
    pub extensions: Vec<String>,
    pub accept_ranges: bool,
    pub fallthrough: bool,
}

impl FileOptions {
    pub fn from_serve(serve: &ServeConfig) -> Self {
        Self {
            dotfiles: serve.dotfiles,
            index: serve.index.files(),
            redirect: serve.redirect,
            extensions: serve.extensions.list(),
            accept_ranges: serve.accept_ranges,
            fallthrough: serve.fallthrough,
        }
    }
}
