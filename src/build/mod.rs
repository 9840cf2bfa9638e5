mod clean;
mod command;
mod core;
mod debug;
mod error;
mod launch;
mod marker;
mod phase;
mod select;
mod state;
mod terminal;
mod workspace;

pub use clean::CleanOutcome;
pub use command::{BUILD_DIR_NAME, CommandChain, Step, backend_step, configure_step};
pub use core::{BuildOutcome, Orchestrator, Precondition, RunOutcome};
pub use error::BuildError;
pub use launch::{LaunchProfile, resolve_profile};
pub use marker::{BuildMarker, MARKER_FILE_NAME, MarkerSignal, WaitPolicy};
pub use phase::BuildPhase;
pub use state::{
    BuildState, BuildSubsystem, BuildVariant, load_phase, load_state, save_phase, save_state,
};
pub use terminal::{ShellTerminal, Terminal, TerminalFactory, Terminals};
pub use workspace::{BUILD_SCRIPT_NAME, Workspace};
