use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::command::{CommandChain, Step, backend_step, configure_step};
use super::error::BuildError;
use super::marker::{MarkerSignal, WaitPolicy};
use super::phase::BuildPhase;
use super::state::BuildState;
use super::terminal::Terminals;
use super::workspace::{BUILD_SCRIPT_NAME, Workspace};
use crate::config::{BuildConfig, CtkConfig, DebugConfig, MarkerMode, TestConfig};
use crate::platform::PlatformInfo;
use crate::ui::{self, Notifier};

/// Why a build was not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    NoWorkspace,
    NoBuildScript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Completed,
    /// Only reported with a status marker
    Failed { code: i32 },
    Skipped(Precondition),
}

/// Result of `run`, `debug` and `test`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Launched(PathBuf),
    ExecutableMissing(PathBuf),
    BuildSkipped(Precondition),
    BuildFailed { code: i32 },
}

/// Drives clean, build, run, debug and test for one workspace.
///
/// Commands are sent to named terminals; completion of a build is observed
/// through the marker file written by the last statement of the chain.
pub struct Orchestrator {
    pub(super) workspace: Option<Workspace>,
    pub(super) platform: PlatformInfo,
    pub(super) build: BuildConfig,
    pub(super) debug: DebugConfig,
    pub(super) test: TestConfig,
    pub(super) terminals: Terminals,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) cancel: CancellationToken,
    pub(super) progress: bool,
    phase: BuildPhase,
}

impl Orchestrator {
    pub fn new(
        workspace: Option<Workspace>,
        platform: PlatformInfo,
        config: &CtkConfig,
        terminals: Terminals,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            workspace,
            platform,
            build: config.build.clone(),
            debug: config.debug.clone(),
            test: config.test.clone(),
            terminals,
            notifier,
            cancel: CancellationToken::new(),
            progress: false,
            phase: BuildPhase::Idle,
        }
    }

    /// Share a cancellation token, typically fired on Ctrl-C.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Show a spinner while waiting for the build.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.workspace.as_ref()
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    pub fn terminals(&self) -> &Terminals {
        &self.terminals
    }

    /// Wait for lines already sent to terminals, such as a launched program.
    pub async fn finish(self) {
        let terminals = self.terminals;
        if let Err(e) = tokio::task::spawn_blocking(move || terminals.close_all()).await {
            tracing::warn!(error = %e, "closing terminals failed");
        }
    }

    pub(super) fn enter(&mut self, next: BuildPhase) -> Result<(), BuildError> {
        if !self.phase.can_move_to(next) {
            return Err(BuildError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!(from = %self.phase, to = %next, "phase change");
        self.phase = next;
        Ok(())
    }

    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy {
            poll_interval: self.build.poll_interval(),
            timeout: self.build.timeout(),
            mode: self.build.marker,
        }
    }

    /// Send a command line to the terminal called `name`.
    pub(super) fn dispatch(&mut self, name: &str, line: &str) -> Result<(), BuildError> {
        self.terminals
            .find_or_create(name)
            .send_text(line)
            .map_err(|reason| BuildError::Dispatch {
                terminal: name.to_string(),
                reason,
            })
    }

    /// Workspace that is ready to build, or the reason it is not.
    fn buildable(&self) -> Result<Workspace, Precondition> {
        let Some(workspace) = &self.workspace else {
            self.notifier.error("No workspace folder is open.");
            return Err(Precondition::NoWorkspace);
        };
        if !workspace.build_script().is_file() {
            self.notifier.error(&format!(
                "{} not found in {}.",
                BUILD_SCRIPT_NAME,
                workspace.root().display()
            ));
            return Err(Precondition::NoBuildScript);
        }
        Ok(workspace.clone())
    }

    /// The chain sent to the build terminal.
    pub fn build_chain(&self, workspace: &Workspace, state: &BuildState) -> CommandChain {
        let marker = workspace.marker().path().to_path_buf();
        let chain = CommandChain::new()
            .then(configure_step(state, &self.platform))
            .then(backend_step(state, &self.platform));
        match self.build.marker {
            MarkerMode::Presence => chain.then(Step::Touch(marker)),
            MarkerMode::Status => chain.finally(Step::WriteStatus(marker)),
        }
    }

    /// Configure and build, then wait for the completion marker.
    pub async fn build(&mut self, state: &BuildState) -> Result<BuildOutcome, BuildError> {
        let workspace = match self.buildable() {
            Ok(workspace) => workspace,
            Err(reason) => return Ok(BuildOutcome::Skipped(reason)),
        };

        self.enter(BuildPhase::Building)?;
        let result = self.build_in(&workspace, state).await;
        let next = match &result {
            Ok(BuildOutcome::Completed) => BuildPhase::Completed,
            _ => BuildPhase::Failed,
        };
        self.enter(next)?;

        match &result {
            Ok(BuildOutcome::Completed) => self.notifier.info(&format!("Build finished ({})", state)),
            Ok(BuildOutcome::Failed { code }) => {
                self.notifier.error(&format!("Build failed with exit code {}.", code))
            }
            Ok(BuildOutcome::Skipped(_)) => {}
            Err(e) => self.notifier.error(&format!("Build failed: {}", e)),
        }
        result
    }

    async fn build_in(
        &mut self,
        workspace: &Workspace,
        state: &BuildState,
    ) -> Result<BuildOutcome, BuildError> {
        let marker = workspace.marker();
        let retries = self.build.marker_delete_retries;
        let delay = self.build.marker_delete_delay();

        // A leftover marker would end the wait before the new build starts.
        marker.remove(retries, delay).await?;

        let line = self.build_chain(workspace, state).render(&self.platform);
        let terminal = self.build.build_terminal.clone();
        tracing::info!(%state, terminal = %terminal, "dispatching build");
        self.dispatch(&terminal, &line)?;

        let pb = ui::spinner(&format!("Building ({})...", state), self.progress);
        let waited = marker.wait(&self.wait_policy(), &self.cancel).await;
        pb.finish_and_clear();
        let signal = waited?;

        marker.remove(retries, delay).await?;

        Ok(match signal {
            MarkerSignal::Exit(code) if code != 0 => BuildOutcome::Failed { code },
            _ => BuildOutcome::Completed,
        })
    }

    /// Build, then start the native executable in the run terminal.
    pub async fn run(
        &mut self,
        state: &BuildState,
        should_clean: bool,
    ) -> Result<RunOutcome, BuildError> {
        if should_clean {
            self.clean(true).await;
        }

        match self.build(state).await? {
            BuildOutcome::Completed => {}
            BuildOutcome::Failed { code } => return Ok(RunOutcome::BuildFailed { code }),
            BuildOutcome::Skipped(reason) => return Ok(RunOutcome::BuildSkipped(reason)),
        }

        let Some(workspace) = &self.workspace else {
            return Ok(RunOutcome::BuildSkipped(Precondition::NoWorkspace));
        };
        let executable = workspace.executable(&self.platform);
        if !executable.is_file() {
            self.notifier
                .error(&format!("Executable not found: {}", executable.display()));
            return Ok(RunOutcome::ExecutableMissing(executable));
        }

        self.enter(BuildPhase::Running)?;
        let line = CommandChain::new()
            .then(Step::exec([executable.to_string_lossy()]))
            .render(&self.platform);
        let terminal = self.build.run_terminal.clone();
        self.dispatch(&terminal, &line)?;
        Ok(RunOutcome::Launched(executable))
    }
}
