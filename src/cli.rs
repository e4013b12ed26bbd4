//! Command line interface
//!
//! `dirindex [ROOT] [PORT] [LISTING] [OPTIONS]`; every positional is optional
//! and overrides the matching key from the config file and environment.

use clap::error::{ContextKind, ErrorKind};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Whether directory listings are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Listing {
    Yes,
    No,
}

/// Static file server with directory listings
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Directory to serve (serve.root)
    pub root: Option<PathBuf>,

    /// Port to listen on, 1-65535 (server.port)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Generate listings for directories (serve.listing)
    #[arg(value_enum)]
    pub listing: Option<Listing>,

    /// Serve options as JSON or key=value pairs, e.g. 'dotfiles=deny, maxAge=1d'
    pub options: Option<String>,

    /// Configuration file, extension optional
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

impl Cli {
    /// Arguments for running against `root` with no config file, used by tests
    #[cfg(test)]
    pub fn for_root(root: &std::path::Path) -> Self {
        Self {
            root: Some(root.to_path_buf()),
            port: None,
            listing: None,
            options: None,
            config: "dirindex-test-no-such-config".to_string(),
        }
    }
}

/// Exit status for a rejected command line
///
/// A bad listing switch exits 5 and a bad port 6; everything else keeps
/// clap's own status (0 for help and version, 2 for usage errors).
pub fn exit_code(err: &clap::Error) -> i32 {
    if !matches!(err.kind(), ErrorKind::InvalidValue | ErrorKind::ValueValidation) {
        return err.exit_code();
    }
    let arg = err
        .get(ContextKind::InvalidArg)
        .map(ToString::to_string)
        .unwrap_or_default();
    if arg.contains("LISTING") {
        5
    } else if arg.contains("PORT") {
        6
    } else {
        err.exit_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positionals() {
        let cli = Cli::parse_from(["dirindex", "/srv/www", "8080", "no", "dotfiles=deny"]);
        assert_eq!(cli.root, Some(PathBuf::from("/srv/www")));
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.listing, Some(Listing::No));
        assert_eq!(cli.options.as_deref(), Some("dotfiles=deny"));
        assert_eq!(cli.config, "config");
    }

    #[test]
    fn test_port_out_of_range() {
        let err = Cli::try_parse_from(["dirindex", ".", "0"]).unwrap_err();
        assert_eq!(exit_code(&err), 6);
        let err = Cli::try_parse_from(["dirindex", ".", "70000"]).unwrap_err();
        assert_eq!(exit_code(&err), 6);
    }

    #[test]
    fn test_listing_values() {
        let err = Cli::try_parse_from(["dirindex", ".", "3000", "maybe"]).unwrap_err();
        assert_eq!(exit_code(&err), 5);
        let cli = Cli::parse_from(["dirindex"]);
        assert!(cli.root.is_none() && cli.listing.is_none());
    }

    #[test]
    fn test_other_usage_errors_keep_clap_status() {
        let err = Cli::try_parse_from(["dirindex", "--no-such-flag"]).unwrap_err();
        assert_eq!(exit_code(&err), 2);
        let err = Cli::try_parse_from(["dirindex", "--help"]).unwrap_err();
        assert_eq!(exit_code(&err), 0);
    }
}
