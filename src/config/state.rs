// Application state module
// Immutable process-wide state built once before the accept loop starts

use std::sync::Arc;

use super::host::HostEnvironment;
use super::types::{Config, FileOptions, ListingPolicy};
use crate::http::headers::SetHeaders;
use crate::logger::LogFormat;

/// Listing template shipped with the binary
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/listing.html");

/// Application state, shared read-only by every connection
pub struct AppState {
    pub config: Config,
    pub policy: ListingPolicy,
    pub files: FileOptions,
    pub template: String,
    pub host: HostEnvironment,
    pub header_hook: Option<Arc<dyn SetHeaders>>,
    /// `Server` response header value
    pub server_name: String,
    pub access_format: LogFormat,
}

impl AppState {
    pub fn new(
        config: Config,
        template: String,
        host: HostEnvironment,
        header_hook: Option<Arc<dyn SetHeaders>>,
    ) -> Self {
        let policy = ListingPolicy::from_serve(&config.serve);
        let files = FileOptions::from_serve(&config.serve);
        let server_name = config.http.server_name.clone();
        let access_format = LogFormat::parse(&config.logging.access_log_format);
        Self {
            config,
            policy,
            files,
            template,
            host,
            header_hook,
            server_name,
            access_format,
        }
    }

    pub fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
