//! Build tree cleanup.
//!
//! `ctk clean` removes `<root>/build` recursively. Project state under
//! `.ctk/` is left alone.

use super::core::Orchestrator;
use super::phase::BuildPhase;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanOutcome {
    Removed,
    /// There was no build directory (or no workspace)
    Absent,
    /// Removal failed; the message has already been reported
    Failed(String),
}

impl Orchestrator {
    /// Remove the build directory. Nothing is reported when `silent`.
    pub async fn clean(&mut self, silent: bool) -> CleanOutcome {
        let Some(build_dir) = self.workspace.as_ref().map(|ws| ws.build_dir()) else {
            return CleanOutcome::Absent;
        };

        if !build_dir.exists() {
            if !silent {
                self.notifier.warn("Nothing to clean");
            }
            return CleanOutcome::Absent;
        }

        self.reset(BuildPhase::Cleaning);
        let outcome = match tokio::fs::remove_dir_all(&build_dir).await {
            Ok(()) => {
                if !silent {
                    self.notifier.info("Clean complete.");
                }
                CleanOutcome::Removed
            }
            Err(e) => {
                let message = format!("Failed to remove {}: {}", build_dir.display(), e);
                tracing::warn!(error = %e, "clean failed");
                self.notifier.error(&message);
                CleanOutcome::Failed(message)
            }
        };
        self.reset(BuildPhase::Idle);
        outcome
    }

    fn reset(&mut self, next: BuildPhase) {
        if let Err(e) = self.enter(next) {
            tracing::warn!(error = %e, "phase not updated");
        }
    }
}
