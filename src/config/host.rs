// Host environment module
// Probes once at startup where the process runs; logging and the banner read only this value

use std::fmt;
use std::io::IsTerminal;
use std::path::Path;

/// Where the server process is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEnvironment {
    /// Attached to a terminal
    Interactive,
    /// Started by systemd (journal captures stdout)
    Systemd,
    /// Inside a container runtime
    Container,
    Unknown,
}

/// Raw capability flags gathered from the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe {
    pub stdout_is_terminal: bool,
    pub systemd: bool,
    pub container: bool,
}

impl HostProbe {
    pub fn gather() -> Self {
        Self {
            stdout_is_terminal: std::io::stdout().is_terminal(),
            systemd: std::env::var_os("INVOCATION_ID").is_some()
                || std::env::var_os("JOURNAL_STREAM").is_some(),
            container: Path::new("/.dockerenv").exists()
                || Path::new("/run/.containerenv").exists()
                || std::env::var_os("container").is_some(),
        }
    }
}

impl HostEnvironment {
    pub fn detect() -> Self {
        Self::from_probe(HostProbe::gather())
    }

    /// A terminal wins over service managers; systemd wins over container markers
    pub const fn from_probe(probe: HostProbe) -> Self {
        if probe.stdout_is_terminal {
            Self::Interactive
        } else if probe.systemd {
            Self::Systemd
        } else if probe.container {
            Self::Container
        } else {
            Self::Unknown
        }
    }

    pub const fn colors(self) -> bool {
        matches!(self, Self::Interactive)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Interactive => "interactive",
            Self::Systemd => "systemd",
            Self::Container => "container",
            Self::Unknown => "unknown",
        }
    }

    /// Version string used in the startup banner
    pub fn version_string(self) -> String {
        format!(
            "{} {} ({}, {})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            std::env::consts::OS,
            self.label()
        )
    }
}

impl fmt::Display for HostEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_precedence() {
        let all = HostProbe {
            stdout_is_terminal: true,
            systemd: true,
            container: true,
        };
        assert_eq!(HostEnvironment::from_probe(all), HostEnvironment::Interactive);

        let service = HostProbe {
            stdout_is_terminal: false,
            ..all
        };
        assert_eq!(HostEnvironment::from_probe(service), HostEnvironment::Systemd);

        let docker = HostProbe {
            container: true,
            ..HostProbe::default()
        };
        assert_eq!(HostEnvironment::from_probe(docker), HostEnvironment::Container);
        assert_eq!(
            HostEnvironment::from_probe(HostProbe::default()),
            HostEnvironment::Unknown
        );
    }

    #[test]
    fn test_only_terminal_gets_colors() {
        assert!(HostEnvironment::Interactive.colors());
        assert!(!HostEnvironment::Systemd.colors());
        assert!(!HostEnvironment::Unknown.colors());
    }

    #[test]
    fn test_version_string() {
        let v = HostEnvironment::Container.version_string();
        assert!(v.starts_with("dirindex "));
        assert!(v.ends_with(", container)"));
    }
}
