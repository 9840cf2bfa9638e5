use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the orchestrator is in the clean/build/run cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    #[default]
    Idle,
    Cleaning,
    Building,
    Completed,
    Failed,
    Running,
    Debugging,
}

impl BuildPhase {
    /// Whether `self -> next` is a legal move.
    ///
    /// A new clean or build may start from any phase; running and debugging
    /// require a completed build.
    pub fn can_move_to(self, next: BuildPhase) -> bool {
        use BuildPhase::*;
        match next {
            Cleaning | Building | Idle => true,
            Completed | Failed => self == Building,
            Running | Debugging => matches!(self, Completed | Running | Debugging),
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Idle => "idle",
            BuildPhase::Cleaning => "cleaning",
            BuildPhase::Building => "building",
            BuildPhase::Completed => "completed",
            BuildPhase::Failed => "failed",
            BuildPhase::Running => "running",
            BuildPhase::Debugging => "debugging",
        };
        f.write_str(name)
    }
}
