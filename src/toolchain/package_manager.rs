use std::collections::BTreeMap;
use std::fmt;

use super::types::{ProbeStyle, ToolSpec};
use crate::platform::PlatformFamily;

/// Package manager used to install missing tools on each platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// Debian-family Linux, elevated through `sudo`
    Apt,
    Homebrew,
    /// User-scoped Windows installer, may need bootstrapping
    Scoop,
}

/// A fully resolved install invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    pub program: String,
    pub args: Vec<String>,
    /// The session password must be written to stdin
    pub needs_credential: bool,
}

impl InstallCommand {
    fn new(program: &str, args: &[&str], needs_credential: bool) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            needs_credential,
        }
    }
}

const SUDO: [&str; 3] = ["-S", "-p", ""];

impl PackageManager {
    pub fn for_platform(family: PlatformFamily) -> Self {
        match family {
            PlatformFamily::Linux => PackageManager::Apt,
            PlatformFamily::MacOs => PackageManager::Homebrew,
            PlatformFamily::Windows => PackageManager::Scoop,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Homebrew => "Homebrew",
            PackageManager::Scoop => "Scoop",
        }
    }

    pub fn requires_elevation(&self) -> bool {
        matches!(self, PackageManager::Apt)
    }

    /// Built-in package names that differ from the command name.
    fn builtin_alias(&self, tool: &str) -> Option<&'static str> {
        match (self, tool) {
            (PackageManager::Apt, "ninja") => Some("ninja-build"),
            (PackageManager::Scoop, "gcc" | "gdb") => Some("mingw"),
            _ => None,
        }
    }

    /// Spec for `tool` with the package name resolved for this manager.
    /// Entries in `overrides` win over the built-in table.
    pub fn tool_spec(&self, tool: &str, overrides: &BTreeMap<String, String>) -> ToolSpec {
        let spec = ToolSpec::new(tool);
        match overrides.get(tool).map(String::as_str).or(self.builtin_alias(tool)) {
            Some(package) if package != tool => spec.with_package(package),
            _ => spec,
        }
    }

    pub fn install_command(&self, package: &str) -> InstallCommand {
        match self {
            PackageManager::Apt => {
                let mut args: Vec<&str> = SUDO.to_vec();
                args.extend(["apt-get", "install", "-y", package]);
                InstallCommand::new("sudo", &args, true)
            }
            PackageManager::Homebrew => InstallCommand::new("brew", &["install", package], false),
            PackageManager::Scoop => InstallCommand::new("scoop", &["install", package], false),
        }
    }

    /// How to tell whether the manager itself is installed.
    pub fn detection(&self) -> ToolSpec {
        match self {
            PackageManager::Apt => ToolSpec::new("apt-get"),
            PackageManager::Homebrew => ToolSpec::new("brew"),
            // scoop has no version flag
            PackageManager::Scoop => ToolSpec::new("scoop").with_probe(ProbeStyle::BareLaunch),
        }
    }

    /// Installer for the manager itself, where one can be run unattended.
    pub fn bootstrap_command(&self) -> Option<InstallCommand> {
        match self {
            PackageManager::Scoop => Some(InstallCommand::new(
                "powershell",
                &[
                    "-NoProfile",
                    "-ExecutionPolicy",
                    "RemoteSigned",
                    "-Command",
                    "irm get.scoop.sh | iex",
                ],
                false,
            )),
            PackageManager::Apt | PackageManager::Homebrew => None,
        }
    }

    /// Command that validates the session password without side effects.
    pub fn credential_check(&self) -> Option<InstallCommand> {
        self.requires_elevation().then(|| {
            let mut args: Vec<&str> = SUDO.to_vec();
            args.push("-v");
            InstallCommand::new("sudo", &args, true)
        })
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
