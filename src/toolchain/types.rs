use std::fmt;
use thiserror::Error;

use crate::platform::PlatformError;

/// How a tool is probed for availability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStyle {
    /// `<tool> --version`
    VersionFlag,
    /// Launch with no arguments; a clean start means it is there
    BareLaunch,
}

/// A required tool and the package that provides it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Command name used for detection
    pub name: String,
    /// Package name when it differs from `name` for the active package manager
    pub package: Option<String>,
    pub probe: ProbeStyle,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
            probe: ProbeStyle::VersionFlag,
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_probe(mut self, probe: ProbeStyle) -> Self {
        self.probe = probe;
        self
    }

    /// The argument handed to the package manager
    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheckResult {
    pub tool: ToolSpec,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStatus {
    Installed,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub tool: ToolSpec,
    pub status: InstallStatus,
}

impl InstallOutcome {
    pub fn installed(tool: ToolSpec) -> Self {
        Self {
            tool,
            status: InstallStatus::Installed,
        }
    }

    pub fn failed(tool: ToolSpec, reason: impl Into<String>) -> Self {
        Self {
            tool,
            status: InstallStatus::Failed(reason.into()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == InstallStatus::Installed
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            InstallStatus::Installed => None,
            InstallStatus::Failed(reason) => Some(reason),
        }
    }
}

/// Every outcome of one provisioning batch, in install order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub outcomes: Vec<InstallOutcome>,
}

impl InstallReport {
    pub fn push(&mut self, outcome: InstallOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn installed(&self) -> impl Iterator<Item = &InstallOutcome> {
        self.outcomes.iter().filter(|o| o.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &InstallOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(InstallOutcome::succeeded)
    }

    /// Summary lines: one for the installed group, one per failure.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let installed: Vec<&str> = self.installed().map(|o| o.tool.name.as_str()).collect();
        if !installed.is_empty() {
            lines.push(format!(
                "Installed {}. Restart your shell or editor to pick them up.",
                installed.join(", ")
            ));
        }
        for outcome in self.failed() {
            lines.push(format!(
                "Failed to install {}: {}",
                outcome.tool.name,
                outcome.failure_reason().unwrap_or("unknown error")
            ));
        }
        lines
    }
}

/// A password held for the length of one provisioning session.
///
/// It is never printed; `Debug` is redacted and the buffer is cleared on drop.
pub struct Credential(String);

impl Credential {
    pub fn new(secret: String) -> Self {
        Self(secret)
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        let mut bytes = std::mem::take(&mut self.0).into_bytes();
        bytes.fill(0);
    }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("{manager} is required to install tools and was not installed")]
    BootstrapDeclined { manager: String },

    #[error("failed to install {manager}: {reason}")]
    BootstrapFailed { manager: String, reason: String },

    #[error("a password is required to install packages")]
    CredentialRequired,

    #[error("password rejected after {attempts} attempts")]
    CredentialRejected { attempts: u32 },

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
