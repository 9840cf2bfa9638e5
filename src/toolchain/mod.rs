//! Tool detection and provisioning
//!
//! Required tools are probed concurrently on `PATH`; missing ones are
//! installed one at a time through the platform's package manager.

pub mod detect;
pub mod install;
pub mod package_manager;
pub mod process;
pub mod types;

pub use detect::AvailabilityChecker;
pub use install::{PASSWORD_ATTEMPTS, Provisioner, notify_report, provision};
pub use package_manager::{InstallCommand, PackageManager};
pub use process::{CommandRunner, LaunchResult, ProcessProbe, SystemProbe, SystemRunner};
pub use types::{
    Credential, InstallOutcome, InstallReport, InstallStatus, ProbeStyle, ProvisionError,
    ToolCheckResult, ToolSpec,
};

use std::collections::BTreeMap;

/// Specs for the configured tool names, package names resolved for `manager`.
pub fn required_tools(
    names: &[String],
    manager: PackageManager,
    aliases: &BTreeMap<String, String>,
) -> Vec<ToolSpec> {
    names
        .iter()
        .map(|name| manager.tool_spec(name, aliases))
        .collect()
}
