//! Host platform detection.
//!
//! The platform is classified once per process into one of the three
//! supported families. Everything that differs between hosts (how commands
//! are chained, how arguments are quoted, the executable suffix) hangs off
//! [`PlatformInfo`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Supported operating system families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformFamily {
    Windows,
    Linux,
    #[serde(rename = "macOS")]
    MacOs,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("unsupported platform '{0}' (expected windows, linux or macos)")]
    Unsupported(String),
}

impl PlatformFamily {
    /// Classify an OS identifier as reported by `std::env::consts::OS`.
    pub fn from_os(os: &str) -> Result<Self, PlatformError> {
        match os {
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            "macos" => Ok(Self::MacOs),
            other => Err(PlatformError::Unsupported(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
            Self::MacOs => "macos",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shell that interprets command lines sent to a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    Posix,
    PowerShell,
}

impl Shell {
    /// Program and leading arguments used to run a single command line.
    pub fn invocation(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Shell::Posix => ("sh", &["-c"]),
            Shell::PowerShell => ("powershell", &["-NoProfile", "-Command"]),
        }
    }

    /// Quote one argument for this shell. Plain words pass through untouched.
    pub fn quote<'a>(&self, arg: &'a str) -> Cow<'a, str> {
        let plain = !arg.is_empty()
            && arg
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_./:=+,@%".contains(c));
        if plain {
            return Cow::Borrowed(arg);
        }
        match self {
            Shell::Posix => Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''"))),
            Shell::PowerShell => Cow::Owned(format!("'{}'", arg.replace('\'', "''"))),
        }
    }
}

/// Facts about the host that other components depend on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    pub family: PlatformFamily,
}

static DETECTED: OnceLock<Option<PlatformFamily>> = OnceLock::new();

impl PlatformInfo {
    pub fn new(family: PlatformFamily) -> Self {
        Self { family }
    }

    /// Detect the host platform. The result is computed once per process.
    pub fn detect() -> Result<Self, PlatformError> {
        let family = DETECTED.get_or_init(|| PlatformFamily::from_os(std::env::consts::OS).ok());
        match family {
            Some(family) => Ok(Self::new(*family)),
            None => Err(PlatformError::Unsupported(std::env::consts::OS.to_string())),
        }
    }

    /// Statement separator used when chaining build stages.
    ///
    /// Windows terminals run PowerShell, which only chains with `;`.
    /// POSIX shells use `&&` so the chain stops at the first failure.
    pub fn separator(&self) -> &'static str {
        match self.family {
            PlatformFamily::Windows => ";",
            PlatformFamily::Linux | PlatformFamily::MacOs => "&&",
        }
    }

    pub fn exe_suffix(&self) -> &'static str {
        match self.family {
            PlatformFamily::Windows => ".exe",
            PlatformFamily::Linux | PlatformFamily::MacOs => "",
        }
    }

    pub fn executable_name(&self, stem: &str) -> String {
        format!("{}{}", stem, self.exe_suffix())
    }

    pub fn shell(&self) -> Shell {
        match self.family {
            PlatformFamily::Windows => Shell::PowerShell,
            PlatformFamily::Linux | PlatformFamily::MacOs => Shell::Posix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os_known_families() {
        assert_eq!(PlatformFamily::from_os("windows"), Ok(PlatformFamily::Windows));
        assert_eq!(PlatformFamily::from_os("linux"), Ok(PlatformFamily::Linux));
        assert_eq!(PlatformFamily::from_os("macos"), Ok(PlatformFamily::MacOs));
    }

    #[test]
    fn test_from_os_rejects_unknown() {
        let err = PlatformFamily::from_os("freebsd").unwrap_err();
        assert_eq!(err, PlatformError::Unsupported("freebsd".into()));
        assert!(err.to_string().contains("freebsd"));
    }

    #[test]
    fn test_detect_is_stable() {
        let first = PlatformInfo::detect();
        let second = PlatformInfo::detect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_separator_and_suffix() {
        let win = PlatformInfo::new(PlatformFamily::Windows);
        let linux = PlatformInfo::new(PlatformFamily::Linux);
        let mac = PlatformInfo::new(PlatformFamily::MacOs);

        assert_eq!(win.separator(), ";");
        assert_eq!(linux.separator(), "&&");
        assert_eq!(mac.separator(), "&&");

        assert_eq!(win.executable_name("app"), "app.exe");
        assert_eq!(linux.executable_name("app"), "app");
        assert_eq!(mac.executable_name("app"), "app");
    }

    #[test]
    fn test_posix_quoting() {
        let sh = Shell::Posix;
        assert_eq!(sh.quote("build"), "build");
        assert_eq!(sh.quote("CMAKE_BUILD_TYPE=Debug"), "CMAKE_BUILD_TYPE=Debug");
        assert_eq!(sh.quote("/home/me/my project"), "'/home/me/my project'");
        assert_eq!(sh.quote("it's"), r"'it'\''s'");
        assert_eq!(sh.quote(""), "''");
    }

    #[test]
    fn test_powershell_quoting() {
        let ps = Shell::PowerShell;
        assert_eq!(ps.quote("ninja"), "ninja");
        assert_eq!(ps.quote(r"C:\Users\me\My Project"), r"'C:\Users\me\My Project'");
        assert_eq!(ps.quote("it's"), "'it''s'");
    }
}
