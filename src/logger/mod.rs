//! Logger module
//!
//! Server lifecycle lines, leveled diagnostics and the access log. Output goes
//! to stdout/stderr or to files; colors only when the host is interactive.

mod format;
pub mod writer;

pub use format::{AccessLogEntry, LogFormat};

use crate::config::AppState;
use std::net::SocketAddr;
use std::str::FromStr;

/// Verbosity threshold, least to most verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(other.to_string()),
        }
    }
}

/// Initialize the logger from the shared state. Call once at startup.
pub fn init(state: &AppState) -> std::io::Result<()> {
    let logging = &state.config.logging;
    // validated at load time
    let level = logging.level.parse().unwrap_or(Level::Info);
    writer::init(
        logging.access_log_file.as_deref(),
        logging.error_log_file.as_deref(),
        level,
        state.host.colors(),
    )
}

fn enabled(level: Level) -> bool {
    writer::get().map_or(Level::Info, writer::LogWriter::level) >= level
}

fn paint(tag: &str, color: &str, on: bool) -> String {
    if on {
        format!("\x1b[{color}m{tag}\x1b[0m")
    } else {
        tag.to_string()
    }
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(tag: &str, color: &str, message: &str) {
    match writer::get() {
        Some(w) => w.write_error(&format!("{} {message}", paint(tag, color, w.colors_on_error()))),
        None => eprintln!("{tag} {message}"),
    }
}

pub fn log_error(message: &str) {
    write_error("[ERROR]", "31", message);
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error("[WARN]", "33", message);
    }
}

pub fn log_info(message: &str) {
    if enabled(Level::Info) {
        write_info(message);
    }
}

pub fn log_debug(message: &str) {
    if !enabled(Level::Debug) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_info(&format!("{} {message}", paint("[DEBUG]", "36", w.colors_on_info()))),
        None => println!("[DEBUG] {message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, state: &AppState) {
    let config = &state.config;
    let serve = &config.serve;
    let policy = &state.policy;
    let files = &state.files;

    log_info("======================================");
    log_info(&state.host.version_string());
    log_info(&format!("Serving:    {}", serve.root.display()));
    log_info(&format!("Listening:  http://{addr}"));
    log_info(&format!(
        "Listing:    {}",
        if serve.listing { "yes" } else { "no" }
    ));
    log_info(&format!(
        "Options:    dotfiles={}, etag={}, lastModified={}, cacheControl={}, maxAge={}s, immutable={}",
        serve.dotfiles,
        policy.etag,
        policy.last_modified,
        policy.cache_control,
        policy.max_age,
        policy.immutable,
    ));
    log_info(&format!(
        "            index={:?}, redirect={}, extensions={:?}, acceptRanges={}, fallthrough={}",
        files.index, files.redirect, files.extensions, files.accept_ranges, files.fallthrough,
    ));
    if let Some(template) = &serve.template {
        log_info(&format!("Template:   {}", template.display()));
    }
    log_info(&format!("Log level:  {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Workers:    {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log:  {path}"));
    }
    log_info("======================================");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_shutdown(active: usize) {
    log_info(&format!(
        "[Shutdown] Stopped accepting, {active} connection(s) still open"
    ));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &LogFormat) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}
