//! Build command handlers
//!
//! Handles `ctk clean`, `ctk build`, `ctk run`, `ctk debug`, `ctk test` and
//! `ctk debug-test`.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::Session;
use crate::build::{
    BuildError, BuildOutcome, BuildState, BuildVariant, CleanOutcome, Orchestrator, RunOutcome,
    save_phase,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildAction {
    Clean,
    Build,
    Run { clean: bool },
    Debug,
    Test,
    DebugTest,
}

/// Run one action. Returns whether it succeeded; failures have already been
/// reported to the user.
pub async fn handle(
    session: &Session,
    action: BuildAction,
    state: BuildState,
    cancel: CancellationToken,
) -> Result<bool> {
    let mut orchestrator = session.orchestrator(cancel);
    tracing::debug!(?action, %state, "running build action");

    let result = perform(&mut orchestrator, action, &state).await;

    if let Some(ws) = &session.workspace
        && ws.build_script().is_file()
        && let Err(e) = save_phase(ws.root(), orchestrator.phase())
    {
        tracing::warn!(error = %e, "could not record build phase");
    }

    orchestrator.finish().await;
    Ok(result?)
}

async fn perform(
    orchestrator: &mut Orchestrator,
    action: BuildAction,
    state: &BuildState,
) -> Result<bool, BuildError> {
    Ok(match action {
        BuildAction::Clean => !matches!(orchestrator.clean(false).await, CleanOutcome::Failed(_)),
        BuildAction::Build => orchestrator.build(state).await? == BuildOutcome::Completed,
        BuildAction::Run { clean } => launched(orchestrator.run(state, clean).await?),
        BuildAction::Debug => launched(orchestrator.debug(state).await?),
        BuildAction::Test => launched(orchestrator.test(state).await?),
        BuildAction::DebugTest => {
            launched(orchestrator.debug(&state.with_variant(BuildVariant::Test)).await?)
        }
    })
}

fn launched(outcome: RunOutcome) -> bool {
    matches!(outcome, RunOutcome::Launched(_))
}
