//! Configuration file parsing (`ctk.toml`).
//!
//! Every key is optional. The project file wins over the user-wide file in
//! `~/.ctk/config.toml`; with neither present the built-in defaults apply.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::build::{BuildState, BuildSubsystem, BuildVariant};

pub const CONFIG_FILE_NAME: &str = "ctk.toml";

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CtkConfig {
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub test: TestConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// How the build chain reports completion through the marker file
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerMode {
    /// The marker exists once the chain finished successfully
    #[default]
    Presence,
    /// The marker always appears and holds the exit code of the build
    Status,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub variant: BuildVariant,
    pub subsystem: BuildSubsystem,
    pub poll_interval_ms: u64,
    /// Upper bound for one build, 0 waits forever
    pub timeout_secs: u64,
    pub marker: MarkerMode,
    pub marker_delete_retries: u32,
    pub marker_delete_delay_ms: u64,
    pub build_terminal: String,
    pub run_terminal: String,
    pub debug_terminal: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            variant: BuildVariant::Release,
            subsystem: BuildSubsystem::Ninja,
            poll_interval_ms: 250,
            timeout_secs: 30 * 60,
            marker: MarkerMode::Presence,
            marker_delete_retries: 5,
            marker_delete_delay_ms: 200,
            build_terminal: "CMake Build".to_string(),
            run_terminal: "CMake Run".to_string(),
            debug_terminal: "CMake Debug".to_string(),
        }
    }
}

impl BuildConfig {
    pub fn default_state(&self) -> BuildState {
        BuildState::new(self.variant, self.subsystem)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn marker_delete_delay(&self) -> Duration {
        Duration::from_millis(self.marker_delete_delay_ms)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    /// Name of the launch configuration in `.vscode/launch.json`
    pub profile: String,
    /// Debugger used when the profile does not name a usable one
    pub debugger: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            profile: "c-toolkit launch".to_string(),
            debugger: "gdb".to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TestConfig {
    pub settle_delay_ms: u64,
    /// Command run after the test binary was launched, e.g. `["gcovr", "-r", "."]`
    pub coverage_command: Option<Vec<String>>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 3000,
            coverage_command: None,
        }
    }
}

impl TestConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub required: Vec<String>,
    pub check_timeout_secs: u64,
    pub install_timeout_secs: u64,
    /// Package names that override the built-in table, keyed by tool name
    pub aliases: BTreeMap<String, String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            required: ["gcc", "gdb", "cmake", "ninja"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            check_timeout_secs: 10,
            install_timeout_secs: 15 * 60,
            aliases: BTreeMap::new(),
        }
    }
}

impl ToolsConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs.max(1))
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_secs.max(1))
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ctk").join("config.toml"))
}

/// Parse configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<CtkConfig> {
    toml::from_str(content)
        .context("Failed to parse configuration - check for syntax errors or unknown keys")
}

/// Load configuration for a workspace root.
pub fn load_config(root: Option<&Path>) -> Result<CtkConfig> {
    let candidates = root
        .map(|r| r.join(CONFIG_FILE_NAME))
        .into_iter()
        .chain(user_config_path());

    for path in candidates {
        if !path.exists() {
            continue;
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loading configuration");
        return parse_config(&content).with_context(|| format!("in {}", path.display()));
    }

    Ok(CtkConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, CtkConfig::default());
        assert_eq!(config.build.build_terminal, "CMake Build");
        assert_eq!(config.debug.profile, "c-toolkit launch");
        assert_eq!(config.tools.required, vec!["gcc", "gdb", "cmake", "ninja"]);
        assert_eq!(config.build.timeout(), Some(Duration::from_secs(1800)));
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config(
            r#"
[build]
variant = "Debug"
subsystem = "Make"
timeout_secs = 0
marker = "status"

[test]
coverage_command = ["gcovr", "-r", "."]

[tools]
required = ["cmake"]
aliases = { ninja = "ninja-build" }
"#,
        )
        .unwrap();

        assert_eq!(
            config.build.default_state(),
            BuildState::new(BuildVariant::Debug, BuildSubsystem::Make)
        );
        assert_eq!(config.build.timeout(), None);
        assert_eq!(config.build.marker, MarkerMode::Status);
        assert_eq!(config.build.poll_interval_ms, 250);
        assert_eq!(
            config.test.coverage_command,
            Some(vec!["gcovr".to_string(), "-r".to_string(), ".".to_string()])
        );
        assert_eq!(config.tools.required, vec!["cmake"]);
        assert_eq!(config.tools.aliases.get("ninja").map(String::as_str), Some("ninja-build"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(parse_config("[build]\nvarriant = \"Debug\"\n").is_err());
    }

    #[test]
    fn test_project_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[debug]\ndebugger = \"lldb\"\n",
        )
        .unwrap();
        let config = load_config(Some(dir.path())).unwrap();
        assert_eq!(config.debug.debugger, "lldb");
    }
}
