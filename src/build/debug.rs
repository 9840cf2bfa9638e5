use super::command::{CommandChain, Step};
use super::core::{BuildOutcome, Orchestrator, Precondition, RunOutcome};
use super::error::BuildError;
use super::launch::resolve_profile;
use super::phase::BuildPhase;
use super::state::BuildState;

impl Orchestrator {
    /// Clean build, then start the debugger on the result.
    pub async fn debug(&mut self, state: &BuildState) -> Result<RunOutcome, BuildError> {
        self.clean(true).await;

        match self.build(state).await? {
            BuildOutcome::Completed => {}
            BuildOutcome::Failed { code } => return Ok(RunOutcome::BuildFailed { code }),
            BuildOutcome::Skipped(reason) => return Ok(RunOutcome::BuildSkipped(reason)),
        }

        let Some(workspace) = &self.workspace else {
            return Ok(RunOutcome::BuildSkipped(Precondition::NoWorkspace));
        };
        let profile = resolve_profile(workspace, &self.debug, &self.platform);
        if !profile.program.is_file() {
            self.notifier.error(&format!(
                "Executable not found: {}",
                profile.program.display()
            ));
            return Ok(RunOutcome::ExecutableMissing(profile.program));
        }

        let mut chain = CommandChain::new();
        if profile.cwd != workspace.root() {
            chain = chain.then(Step::exec(["cd".to_string(), profile.cwd.to_string_lossy().into_owned()]));
        }
        let line = chain.then(Step::Exec(profile.argv())).render(&self.platform);

        self.enter(BuildPhase::Debugging)?;
        tracing::info!(debugger = %profile.debugger, profile = %self.debug.profile, "starting debug session");
        let terminal = self.build.debug_terminal.clone();
        self.dispatch(&terminal, &line)?;
        Ok(RunOutcome::Launched(profile.program))
    }
}
