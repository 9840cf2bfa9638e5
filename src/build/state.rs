use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::phase::BuildPhase;

/// Compilation profile passed to CMake as `CMAKE_BUILD_TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum BuildVariant {
    Debug,
    Test,
    Release,
}

/// Backend build driver invoked after configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum BuildSubsystem {
    Ninja,
    Make,
}

impl BuildVariant {
    pub const ALL: [BuildVariant; 3] = [BuildVariant::Debug, BuildVariant::Test, BuildVariant::Release];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::Debug => "Debug",
            BuildVariant::Test => "Test",
            BuildVariant::Release => "Release",
        }
    }
}

impl BuildSubsystem {
    pub const ALL: [BuildSubsystem; 2] = [BuildSubsystem::Ninja, BuildSubsystem::Make];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildSubsystem::Ninja => "Ninja",
            BuildSubsystem::Make => "Make",
        }
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for BuildSubsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildVariant::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown build variant '{}'", s))
    }
}

impl FromStr for BuildSubsystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildSubsystem::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown build subsystem '{}'", s))
    }
}

/// The selected variant and subsystem, threaded through every build operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    pub variant: BuildVariant,
    pub subsystem: BuildSubsystem,
}

impl BuildState {
    pub fn new(variant: BuildVariant, subsystem: BuildSubsystem) -> Self {
        Self { variant, subsystem }
    }

    pub fn with_variant(self, variant: BuildVariant) -> Self {
        Self { variant, ..self }
    }

    pub fn with_subsystem(self, subsystem: BuildSubsystem) -> Self {
        Self { subsystem, ..self }
    }
}

impl Default for BuildState {
    fn default() -> Self {
        Self::new(BuildVariant::Release, BuildSubsystem::Ninja)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.variant, self.subsystem)
    }
}

fn state_path(root: &Path) -> PathBuf {
    root.join(".ctk").join("state.toml")
}

/// On-disk layout of `.ctk/state.toml`
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variant: Option<BuildVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<BuildSubsystem>,
    /// Phase the last build action ended in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_phase: Option<BuildPhase>,
}

fn read_state_file(root: &Path) -> Result<StateFile> {
    let path = state_path(root);
    if !path.exists() {
        return Ok(StateFile::default());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse {} - delete it to reset", path.display()))
}

fn write_state_file(root: &Path, file: &StateFile) -> Result<()> {
    let path = state_path(root);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(file)?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Load the persisted selection, if any.
pub fn load_state(root: &Path) -> Result<Option<BuildState>> {
    let file = read_state_file(root)?;
    Ok(file
        .variant
        .zip(file.subsystem)
        .map(|(variant, subsystem)| BuildState::new(variant, subsystem)))
}

/// Persist the current selection. Only the latest value is kept.
pub fn save_state(root: &Path, state: &BuildState) -> Result<()> {
    let mut file = read_state_file(root)?;
    file.variant = Some(state.variant);
    file.subsystem = Some(state.subsystem);
    write_state_file(root, &file)
}

/// Phase the previous build action left the workspace in.
pub fn load_phase(root: &Path) -> Result<Option<BuildPhase>> {
    Ok(read_state_file(root)?.last_phase)
}

pub fn save_phase(root: &Path, phase: BuildPhase) -> Result<()> {
    let mut file = read_state_file(root)?;
    file.last_phase = Some(phase);
    write_state_file(root, &file)
}
