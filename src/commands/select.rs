use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use super::Session;
use crate::build::save_state;
use crate::ui::InquirePrompter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectTarget {
    Variant,
    Subsystem,
}

/// `ctk select variant|subsystem`: pick a value, persist it, offer a rebuild.
pub async fn handle(session: &Session, target: SelectTarget, cancel: CancellationToken) -> Result<()> {
    let mut orchestrator = session.orchestrator(cancel);
    let prompter = InquirePrompter;
    let current = session.state;

    let selected = match target {
        SelectTarget::Variant => orchestrator.select_variant(current, &prompter).await,
        SelectTarget::Subsystem => orchestrator.select_subsystem(current, &prompter).await,
    };

    if selected != current
        && let Some(workspace) = &session.workspace
    {
        save_state(workspace.root(), &selected).context("Failed to save build state")?;
        tracing::debug!(state = %selected, "selection saved");
    }
    orchestrator.finish().await;
    Ok(())
}
