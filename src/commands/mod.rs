//! CLI command handlers
//!
//! Each handler opens a [`Session`] for the workspace, does its work through
//! the library modules and reports to the console.

pub mod build;
pub mod select;
pub mod status;
pub mod tools;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::build::{BuildState, BuildSubsystem, BuildVariant, Orchestrator, Terminals, Workspace, load_state};
use crate::config::{CtkConfig, load_config};
use crate::platform::PlatformInfo;
use crate::ui::{ConsoleNotifier, Notifier};

/// Everything a command needs to know about where it runs
pub struct Session {
    pub root: PathBuf,
    pub workspace: Option<Workspace>,
    pub platform: PlatformInfo,
    pub config: CtkConfig,
    /// Persisted selection, or the configured default
    pub state: BuildState,
    pub notifier: Arc<dyn Notifier>,
}

impl Session {
    pub fn open(root: &Path) -> Result<Self> {
        let platform = PlatformInfo::detect()?;
        let workspace = Workspace::open(root);
        let config = load_config(workspace.as_ref().map(Workspace::root))?;
        let saved = match &workspace {
            Some(ws) => load_state(ws.root()).context("Failed to read saved build state")?,
            None => None,
        };
        let state = saved.unwrap_or_else(|| config.build.default_state());
        tracing::debug!(root = %root.display(), %state, platform = %platform.family, "session opened");

        Ok(Self {
            root: root.to_path_buf(),
            workspace,
            platform,
            config,
            state,
            notifier: Arc::new(ConsoleNotifier),
        })
    }

    /// The saved state with one-shot command line overrides applied.
    pub fn effective_state(
        &self,
        variant: Option<BuildVariant>,
        subsystem: Option<BuildSubsystem>,
    ) -> BuildState {
        let state = variant.map_or(self.state, |v| self.state.with_variant(v));
        subsystem.map_or(state, |s| state.with_subsystem(s))
    }

    pub fn orchestrator(&self, cancel: CancellationToken) -> Orchestrator {
        let cwd = self
            .workspace
            .as_ref()
            .map_or(self.root.as_path(), Workspace::root);
        let terminals = Terminals::shell(self.platform.shell(), cwd);
        Orchestrator::new(
            self.workspace.clone(),
            self.platform,
            &self.config,
            terminals,
            self.notifier.clone(),
        )
        .with_cancel(cancel)
        .with_progress(true)
    }
}
