//! Installing missing tools through the platform package manager.
//!
//! Installs run one at a time: package managers hold an exclusive lock and
//! concurrent invocations fail. A failing tool never stops the batch; every
//! tool gets an [`InstallOutcome`] and the batch is reported as a whole.
//!
//! A provisioning session ([`provision`]) bootstraps the package manager
//! where needed, asks for the password once on platforms that elevate, and
//! then runs the batch.

use std::collections::BTreeMap;

use super::detect::AvailabilityChecker;
use super::package_manager::{InstallCommand, PackageManager};
use super::process::{CommandRunner, ProcessProbe};
use super::types::{Credential, InstallOutcome, InstallReport, ProvisionError, ToolSpec};
use crate::ui::{self, Notifier, Prompter};

pub const PASSWORD_ATTEMPTS: u32 = 3;

pub struct Provisioner<R> {
    manager: PackageManager,
    runner: R,
    progress: bool,
}

impl<R: CommandRunner> Provisioner<R> {
    pub fn new(manager: PackageManager, runner: R) -> Self {
        Self {
            manager,
            runner,
            progress: false,
        }
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn manager(&self) -> PackageManager {
        self.manager
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    async fn execute(
        &self,
        command: &InstallCommand,
        credential: Option<&Credential>,
    ) -> Result<(), String> {
        let stdin = match (command.needs_credential, credential) {
            (true, Some(credential)) => Some(credential.expose()),
            (true, None) => return Err("a password is required".to_string()),
            (false, _) => None,
        };
        self.runner.run(&command.program, &command.args, stdin).await
    }

    /// Install `tools` in order, collecting one outcome per tool.
    ///
    /// Tools that share a package install it once and share its result.
    pub async fn install_all(
        &self,
        tools: &[ToolSpec],
        credential: Option<&Credential>,
    ) -> InstallReport {
        let mut report = InstallReport::default();
        let mut attempted: BTreeMap<&str, Result<(), String>> = BTreeMap::new();
        for tool in tools {
            let package = tool.package_name();
            let result = match attempted.get(package) {
                Some(result) => {
                    tracing::debug!(tool = %tool.name, package, "package already attempted");
                    result.clone()
                }
                None => {
                    let command = self.manager.install_command(package);
                    tracing::info!(tool = %tool.name, package, manager = %self.manager, "installing");

                    let pb = ui::spinner(&format!("Installing {}...", package), self.progress);
                    let result = self.execute(&command, credential).await;
                    pb.finish_and_clear();

                    if let Err(reason) = &result {
                        tracing::warn!(tool = %tool.name, %reason, "install failed");
                    }
                    attempted.insert(package, result.clone());
                    result
                }
            };

            report.push(match result {
                Ok(()) => InstallOutcome::installed(tool.clone()),
                Err(reason) => InstallOutcome::failed(tool.clone(), reason),
            });
        }
        report
    }

    /// Install the package manager itself.
    pub async fn install_package_manager(&self) -> InstallOutcome {
        let tool = self.manager.detection();
        let Some(command) = self.manager.bootstrap_command() else {
            return InstallOutcome::failed(
                tool,
                format!("{} cannot be installed automatically", self.manager),
            );
        };

        let pb = ui::spinner(&format!("Installing {}...", self.manager), self.progress);
        let result = self.execute(&command, None).await;
        pb.finish_and_clear();

        match result {
            Ok(()) => InstallOutcome::installed(tool),
            Err(reason) => InstallOutcome::failed(tool, reason),
        }
    }

    /// Check a password against the elevation prompt. Always true where no
    /// elevation is needed.
    pub async fn verify_credential(&self, credential: &Credential) -> bool {
        match self.manager.credential_check() {
            Some(command) => self.execute(&command, Some(credential)).await.is_ok(),
            None => true,
        }
    }
}

/// Ask for the password until it verifies. Cancelling the prompt gives up.
async fn request_credential<R: CommandRunner>(
    provisioner: &Provisioner<R>,
    prompter: &dyn Prompter,
    notifier: &dyn Notifier,
) -> Result<Credential, ProvisionError> {
    for attempt in 1..=PASSWORD_ATTEMPTS {
        let secret = prompter
            .password("Password for sudo:")
            .ok_or(ProvisionError::CredentialRequired)?;
        let credential = Credential::new(secret);
        if provisioner.verify_credential(&credential).await {
            return Ok(credential);
        }
        tracing::debug!(attempt, "password rejected");
        if attempt < PASSWORD_ATTEMPTS {
            notifier.warn("Sorry, try again.");
        }
    }
    Err(ProvisionError::CredentialRejected {
        attempts: PASSWORD_ATTEMPTS,
    })
}

/// One provisioning session for `tools`.
///
/// Installs the package manager first if it is missing and can be
/// bootstrapped; declining aborts the session. On elevated platforms the
/// password is requested once and dropped when the session ends.
pub async fn provision<P: ProcessProbe, R: CommandRunner>(
    provisioner: &Provisioner<R>,
    checker: &AvailabilityChecker<P>,
    tools: &[ToolSpec],
    prompter: &dyn Prompter,
    notifier: &dyn Notifier,
) -> Result<InstallReport, ProvisionError> {
    if tools.is_empty() {
        return Ok(InstallReport::default());
    }

    let manager = provisioner.manager();
    if manager.bootstrap_command().is_some() && !checker.check(&manager.detection()).await {
        let question = format!("{} is required to install missing tools. Install it now?", manager);
        if !prompter.confirm(&question) {
            return Err(ProvisionError::BootstrapDeclined {
                manager: manager.to_string(),
            });
        }
        let outcome = provisioner.install_package_manager().await;
        if let Some(reason) = outcome.failure_reason() {
            return Err(ProvisionError::BootstrapFailed {
                manager: manager.to_string(),
                reason: reason.to_string(),
            });
        }
        notifier.info(&format!("{} installed.", manager));
    }

    let credential = if manager.requires_elevation() {
        Some(request_credential(provisioner, prompter, notifier).await?)
    } else {
        None
    };

    Ok(provisioner.install_all(tools, credential.as_ref()).await)
}

/// Report a finished batch: installed tools as one group, each failure with
/// its own reason.
pub fn notify_report(report: &InstallReport, notifier: &dyn Notifier) {
    let mut lines = report.summary().into_iter();
    if report.installed().next().is_some()
        && let Some(line) = lines.next()
    {
        notifier.info(&line);
    }
    for line in lines {
        notifier.error(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, Vec<String>, bool)>>,
    }

    #[async_trait]
    impl CommandRunner for Recorder {
        async fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<(), String> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec(), stdin.is_some()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_credential_fails_each_elevated_install() {
        let provisioner = Provisioner::new(PackageManager::Apt, Recorder::default());
        let report = provisioner
            .install_all(&[ToolSpec::new("gcc"), ToolSpec::new("gdb")], None)
            .await;
        assert_eq!(report.failed().count(), 2);
        assert!(provisioner.runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credential_goes_to_stdin_only() {
        let provisioner = Provisioner::new(PackageManager::Apt, Recorder::default());
        let credential = Credential::new("s3cret".to_string());
        let report = provisioner
            .install_all(&[ToolSpec::new("cmake")], Some(&credential))
            .await;
        assert!(report.all_succeeded());

        let calls = provisioner.runner.calls.lock().unwrap();
        let (program, args, with_stdin) = &calls[0];
        assert_eq!(program, "sudo");
        assert!(*with_stdin);
        assert!(args.iter().all(|a| !a.contains("s3cret")));
    }

    #[tokio::test]
    async fn test_bootstrap_unavailable_for_homebrew() {
        let provisioner = Provisioner::new(PackageManager::Homebrew, Recorder::default());
        let outcome = provisioner.install_package_manager().await;
        assert!(!outcome.succeeded());
    }
}
