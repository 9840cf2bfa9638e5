use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::phase::BuildPhase;

/// Failures that abort a build operation.
///
/// Missing preconditions and a missing executable are not errors; they are
/// reported as outcomes.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("completion marker {path} is still in use after {attempts} attempts: {source}")]
    MarkerBusy {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("build did not signal completion within {0:?}")]
    Timeout(Duration),

    #[error("build wait was cancelled")]
    Cancelled,

    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: BuildPhase, to: BuildPhase },

    #[error("failed to send command to terminal '{terminal}': {reason}")]
    Dispatch { terminal: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
