// Configuration module entry point
// Loads layered configuration, validates it and builds the shared state

mod host;
mod options;
mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::{Cli, Listing};
use crate::http::headers::{SetHeaders, StaticHeaders};
use crate::logger::Level;

// Re-export public types
pub use host::HostEnvironment;
pub use options::{OptionsError, ServeOptions};
pub use state::{AppState, DEFAULT_TEMPLATE};
pub use types::{Config, DotfilesMode, FileOptions, ListingPolicy, MAX_MAX_AGE_SECS};

/// Startup errors; any of these stops the server before it listens
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error("failed to stat root \"{}\": {source}", .root.display())]
    RootUnavailable {
        root: PathBuf,
        source: std::io::Error,
    },
    #[error("provided root \"{}\" is not a directory", .0.display())]
    RootNotDirectory(PathBuf),
    #[error("unknown log level '{0}' (expected error, warn, info or debug)")]
    LogLevel(String),
    #[error("failed to read template \"{}\": {source}", .path.display())]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid [serve.headers]: {0}")]
    Headers(String),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("port must be an integer between 1 and 65535 (inclusive), got {0}")]
    Port(u16),
    #[error("server.workers must be at least 1")]
    Workers,
}

impl ConfigError {
    /// Process exit status for a startup failure
    ///
    /// 1 root stat, 2 root not a directory, 3 unparsable options, 4 invalid
    /// options or configuration, 6 bad port. 5 is the listing switch, which
    /// only the command line can get wrong (see [`crate::cli::exit_code`]).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::RootUnavailable { .. } => 1,
            Self::RootNotDirectory(_) => 2,
            Self::Options(OptionsError::NotAnObject | OptionsError::MissingValue(_)) => 3,
            Self::Options(_)
            | Self::Load(_)
            | Self::LogLevel(_)
            | Self::Template { .. }
            | Self::Headers(_)
            | Self::Workers => 4,
            Self::Port(_) | Self::Address(_) => 6,
        }
    }
}

impl Config {
    /// Layer defaults, config file, `DIRINDEX_*` environment, CLI positionals and the options string
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(&cli.config).required(false))
            .add_source(
                ::config::Environment::with_prefix("DIRINDEX")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.backlog", 128)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default(
                "http.server_name",
                format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            )?
            .set_override_option(
                "serve.root",
                cli.root.as_ref().map(|p| p.display().to_string()),
            )?
            .set_override_option("server.port", cli.port.map(i64::from))?
            .set_override_option("serve.listing", cli.listing.map(|l| l == Listing::Yes))?
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        if let Some(raw) = cli.options.as_deref() {
            ServeOptions::parse(raw)?.apply(&mut config.serve);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks that need the filesystem or cannot be expressed in serde types
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let root = self.serve.root.clone();
        let meta = std::fs::metadata(&root)
            .map_err(|source| ConfigError::RootUnavailable { root: root.clone(), source })?;
        if !meta.is_dir() {
            return Err(ConfigError::RootNotDirectory(root));
        }
        // Requests resolve against an absolute root
        self.serve.root = root
            .canonicalize()
            .map_err(|source| ConfigError::RootUnavailable { root, source })?;

        if self.logging.level.parse::<Level>().is_err() {
            return Err(ConfigError::LogLevel(self.logging.level.clone()));
        }
        self.logging.level = self.logging.level.to_ascii_lowercase();

        if self.server.port == 0 {
            return Err(ConfigError::Port(self.server.port));
        }
        if self.server.workers == Some(0) {
            return Err(ConfigError::Workers);
        }
        Ok(())
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                ConfigError::Address(format!("{}:{} ({e})", self.server.host, self.server.port))
            })
    }

    /// Template text: the configured file, or the built-in one
    pub fn load_template(&self) -> Result<String, ConfigError> {
        match &self.serve.template {
            Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::Template {
                path: path.clone(),
                source,
            }),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }

    pub fn header_hook(&self) -> Result<Option<Arc<dyn SetHeaders>>, ConfigError> {
        let headers = StaticHeaders::from_map(&self.serve.headers).map_err(ConfigError::Headers)?;
        if headers.is_empty() {
            return Ok(None);
        }
        Ok(Some(Arc::new(headers)))
    }
}

impl AppState {
    /// Build the shared state once; nothing is mutated after this point
    pub fn build(config: Config, host: HostEnvironment) -> Result<Self, ConfigError> {
        let template = config.load_template()?;
        let hook = config.header_hook()?;
        Ok(Self::new(config, template, host, hook))
    }
}

/// Test helper: state for `root` with the options string applied
#[cfg(test)]
pub fn test_state(root: &std::path::Path, options: &str) -> Arc<AppState> {
    let mut cli = Cli::for_root(root);
    cli.options = Some(options.to_string());
    let mut config = Config::load(&cli).expect("test config");
    config.logging.access_log = false;
    Arc::new(AppState::build(config, HostEnvironment::Unknown).expect("test state"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&Cli::for_root(dir.path())).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.serve.root, dir.path().canonicalize().unwrap());
        assert!(config.serve.listing);
        assert_eq!(config.serve.dotfiles, DotfilesMode::Allow);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = Cli::for_root(dir.path());
        cli.port = Some(8081);
        cli.listing = Some(Listing::No);
        cli.options = Some("dotfiles=deny, maxAge=1d".to_string());
        let config = Config::load(&cli).unwrap();
        assert_eq!(config.server.port, 8081);
        assert!(!config.serve.listing);
        let policy = ListingPolicy::from_serve(&config.serve);
        assert!(policy.hide_dotfiles);
        assert_eq!(policy.max_age, 86_400);
    }

    #[test]
    fn test_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let err = Config::load(&Cli::for_root(&file)).unwrap_err();
        assert!(matches!(err, ConfigError::RootNotDirectory(_)));

        let err = Config::load(&Cli::for_root(&dir.path().join("missing"))).unwrap_err();
        assert!(matches!(err, ConfigError::RootUnavailable { .. }));
    }

    fn write_config(dir: &std::path::Path, body: &str) -> Cli {
        let file = dir.join("server.toml");
        std::fs::write(&file, body).unwrap();
        let mut cli = Cli::for_root(dir);
        cli.config = file.display().to_string();
        cli
    }

    #[test]
    fn test_port_zero_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = write_config(dir.path(), "[server]\nport = 0\n");
        let err = Config::load(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::Port(0)));
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_zero_workers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = write_config(dir.path(), "[server]\nworkers = 0\n");
        let err = Config::load(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::Workers));
        assert_eq!(err.exit_code(), 4);

        let cli = write_config(dir.path(), "[server]\nworkers = 2\n");
        assert_eq!(Config::load(&cli).unwrap().server.workers, Some(2));
    }

    #[test]
    fn test_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(Config::load(&Cli::for_root(&file)).unwrap_err().exit_code(), 2);
        let missing = Cli::for_root(&dir.path().join("missing"));
        assert_eq!(Config::load(&missing).unwrap_err().exit_code(), 1);

        let mut cli = Cli::for_root(dir.path());
        cli.options = Some("dotfiles".to_string());
        assert_eq!(Config::load(&cli).unwrap_err().exit_code(), 3);
        cli.options = Some("dotfiles=sometimes".to_string());
        assert_eq!(Config::load(&cli).unwrap_err().exit_code(), 4);
    }

    #[test]
    fn test_bad_options_rejected_at_startup() {
        let dir = tempfile::tempdir().unwrap();
        let mut cli = Cli::for_root(dir.path());
        cli.options = Some("dotfiles=sometimes".to_string());
        assert!(matches!(
            Config::load(&cli).unwrap_err(),
            ConfigError::Options(OptionsError::Invalid(_))
        ));
    }

    #[test]
    fn test_state_uses_default_template() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), "");
        assert!(state.template.contains("{list}"));
        assert!(state.header_hook.is_none());
        assert_eq!(state.host, HostEnvironment::Unknown);
    }

    #[test]
    fn test_custom_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("t.html");
        std::fs::write(&template, "<p>{path}</p>{list}").unwrap();
        let mut config = Config::load(&Cli::for_root(dir.path())).unwrap();
        config.serve.template = Some(template);
        assert_eq!(config.load_template().unwrap(), "<p>{path}</p>{list}");

        config.serve.template = Some(dir.path().join("nope.html"));
        assert!(matches!(
            config.load_template().unwrap_err(),
            ConfigError::Template { .. }
        ));
    }
}
