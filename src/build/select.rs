//! Interactive selection of the build variant and subsystem.

use std::fmt::Display;

use super::core::Orchestrator;
use super::state::{BuildState, BuildSubsystem, BuildVariant};
use crate::ui::Prompter;

const REBUILD_QUESTION: &str = "Build type has changed. Do you want to make a clean build?";

/// Offer every value of `all`. `None` when cancelled or `current` is picked again.
fn pick<T: Copy + PartialEq + Display>(
    prompter: &dyn Prompter,
    title: &str,
    all: &[T],
    current: T,
) -> Option<T> {
    let options: Vec<String> = all
        .iter()
        .map(|value| {
            if *value == current {
                format!("{} (current)", value)
            } else {
                value.to_string()
            }
        })
        .collect();
    let choice = *all.get(prompter.select(title, &options)?)?;
    (choice != current).then_some(choice)
}

impl Orchestrator {
    pub async fn select_variant(&mut self, current: BuildState, prompter: &dyn Prompter) -> BuildState {
        match pick(prompter, "Select build type", &BuildVariant::ALL, current.variant) {
            Some(variant) => self.changed(current.with_variant(variant), prompter).await,
            None => current,
        }
    }

    pub async fn select_subsystem(
        &mut self,
        current: BuildState,
        prompter: &dyn Prompter,
    ) -> BuildState {
        match pick(prompter, "Select build subsystem", &BuildSubsystem::ALL, current.subsystem) {
            Some(subsystem) => self.changed(current.with_subsystem(subsystem), prompter).await,
            None => current,
        }
    }

    /// Offer a clean rebuild with the new state. Rebuild problems are
    /// reported; the selection stands either way.
    async fn changed(&mut self, state: BuildState, prompter: &dyn Prompter) -> BuildState {
        tracing::info!(%state, "build state changed");
        if prompter.confirm(REBUILD_QUESTION) {
            self.clean(true).await;
            if let Err(e) = self.build(&state).await {
                tracing::warn!(error = %e, "rebuild after selection failed");
            }
        }
        state
    }
}
