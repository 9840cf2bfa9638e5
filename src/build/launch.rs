//! Debug launch profiles from `.vscode/launch.json`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::workspace::Workspace;
use crate::config::DebugConfig;
use crate::platform::PlatformInfo;

const LAUNCH_FILE: &str = ".vscode/launch.json";

#[derive(Deserialize, Debug, Default)]
struct LaunchFile {
    #[serde(default)]
    configurations: Vec<LaunchEntry>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct LaunchEntry {
    #[serde(default)]
    name: String,
    program: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    cwd: Option<String>,
    mi_debugger_path: Option<String>,
}

/// What to start under the debugger, with every path resolved for this host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchProfile {
    pub debugger: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl LaunchProfile {
    /// `<debugger> --args <program> <args...>`
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![
            self.debugger.clone(),
            "--args".to_string(),
            self.program.to_string_lossy().into_owned(),
        ];
        argv.extend(self.args.iter().cloned());
        argv
    }
}

fn substitute(value: &str, workspace: &Workspace) -> String {
    let root = workspace.root().to_string_lossy();
    value
        .replace("${workspaceRoot}", &root)
        .replace("${workspaceFolder}", &root)
        .replace("${workspaceFolderBasename}", workspace.name())
}

fn read_entry(path: &Path, name: &str) -> Option<LaunchEntry> {
    let content = fs::read_to_string(path).ok()?;
    let file: LaunchFile = match serde_json::from_str(&content) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring invalid launch file");
            return None;
        }
    };
    file.configurations.into_iter().find(|entry| entry.name == name)
}

/// Resolve the launch profile named in `config`.
///
/// Anything the profile does not provide, or provides for another host
/// (such as a Windows debugger path on Linux), falls back to the configured
/// debugger and the workspace's native executable.
pub fn resolve_profile(
    workspace: &Workspace,
    config: &DebugConfig,
    platform: &PlatformInfo,
) -> LaunchProfile {
    let entry = read_entry(&workspace.root().join(LAUNCH_FILE), &config.profile).unwrap_or_default();

    let debugger = entry
        .mi_debugger_path
        .map(|p| substitute(&p, workspace))
        .filter(|p| Path::new(p).is_file())
        .unwrap_or_else(|| config.debugger.clone());

    let program = entry
        .program
        .map(|p| PathBuf::from(substitute(&p, workspace)))
        .filter(|p| p.is_file())
        .unwrap_or_else(|| workspace.executable(platform));

    let cwd = entry
        .cwd
        .map(|p| PathBuf::from(substitute(&p, workspace)))
        .filter(|p| p.is_dir())
        .unwrap_or_else(|| workspace.root().to_path_buf());

    let args = entry.args.iter().map(|a| substitute(a, workspace)).collect();

    LaunchProfile {
        debugger,
        program,
        args,
        cwd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformFamily;

    fn workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::open(dir.path()).unwrap();
        (dir, ws)
    }

    fn write_launch(ws: &Workspace, json: &str) {
        let vscode = ws.root().join(".vscode");
        fs::create_dir_all(&vscode).unwrap();
        fs::write(vscode.join("launch.json"), json).unwrap();
    }

    #[test]
    fn test_missing_launch_file_uses_defaults() {
        let (_dir, ws) = workspace();
        let linux = PlatformInfo::new(PlatformFamily::Linux);
        let profile = resolve_profile(&ws, &DebugConfig::default(), &linux);

        assert_eq!(profile.debugger, "gdb");
        assert_eq!(profile.program, ws.executable(&linux));
        assert_eq!(profile.cwd, ws.root());
        assert!(profile.args.is_empty());
    }

    #[test]
    fn test_profile_paths_are_substituted() {
        let (_dir, ws) = workspace();
        let linux = PlatformInfo::new(PlatformFamily::Linux);
        fs::create_dir_all(ws.build_dir()).unwrap();
        fs::write(ws.build_dir().join("app.bin"), b"").unwrap();
        write_launch(
            &ws,
            r#"{
                "configurations": [
                    { "name": "other", "program": "nope" },
                    {
                        "name": "c-toolkit launch",
                        "type": "cppdbg",
                        "program": "${workspaceRoot}/build/app.bin",
                        "args": ["--name", "${workspaceFolderBasename}"],
                        "cwd": "${workspaceFolder}",
                        "miDebuggerPath": "C:/msys64/mingw64/bin/gdb.exe"
                    }
                ]
            }"#,
        );

        let profile = resolve_profile(&ws, &DebugConfig::default(), &linux);
        assert_eq!(profile.program, ws.build_dir().join("app.bin"));
        assert_eq!(profile.args, vec!["--name".to_string(), ws.name().to_string()]);
        // The Windows debugger path does not exist here.
        assert_eq!(profile.debugger, "gdb");
        assert_eq!(
            profile.argv()[..3],
            [
                "gdb".to_string(),
                "--args".to_string(),
                ws.build_dir().join("app.bin").to_string_lossy().into_owned()
            ]
        );
    }

    #[test]
    fn test_invalid_launch_file_is_ignored() {
        let (_dir, ws) = workspace();
        write_launch(&ws, "{ not json");
        let config = DebugConfig {
            debugger: "lldb".to_string(),
            ..DebugConfig::default()
        };
        let profile = resolve_profile(&ws, &config, &PlatformInfo::new(PlatformFamily::MacOs));
        assert_eq!(profile.debugger, "lldb");
    }
}
