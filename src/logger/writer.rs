//! Log writer module
//!
//! Process-wide sinks for the access log and the error log, fixed at startup.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::Level;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(Mutex<File>),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(Mutex::new(open_log_file(path)?))),
            None => Ok(fallback),
        }
    }

    fn write(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{message}");
                }
            }
        }
    }

    const fn is_terminal_stream(&self) -> bool {
        !matches!(self, Self::File(_))
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    access: LogTarget,
    error: LogTarget,
    level: Level,
    colors: bool,
}

impl LogWriter {
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        level: Level,
        colors: bool,
    ) -> io::Result<Self> {
        Ok(Self {
            access: LogTarget::open(access_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
            level,
            colors,
        })
    }

    pub const fn level(&self) -> Level {
        self.level
    }

    /// Access log lines go out unfiltered and uncolored
    pub fn write_access(&self, message: &str) {
        self.access.write(message);
    }

    /// Informational lines share the access log target
    pub fn write_info(&self, message: &str) {
        self.access.write(message);
    }

    pub fn write_error(&self, message: &str) {
        self.error.write(message);
    }

    /// Whether ANSI colors apply to lines bound for the error target
    pub const fn colors_on_error(&self) -> bool {
        self.colors && self.error.is_terminal_stream()
    }

    pub const fn colors_on_info(&self) -> bool {
        self.colors && self.access.is_terminal_stream()
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer; fails if a log file cannot be opened
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    level: Level,
    colors: bool,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, level, colors)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// The global writer, if `init` has run
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_target_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/access.log");
        let path = path.to_str().unwrap();
        let writer = LogWriter::new(Some(path), None, Level::Info, true).unwrap();
        writer.write_access("first");
        writer.write_access("second");
        assert!(!writer.colors_on_info());
        assert!(writer.colors_on_error());
        assert_eq!(std::fs::read_to_string(path).unwrap(), "first\nsecond\n");
    }
}
