//! Structured shell command composition.
//!
//! Build stages are kept as argument vectors until the moment they are sent
//! to a terminal, where they are quoted for the target shell and joined with
//! the platform separator.

use std::path::{Path, PathBuf};

use super::state::{BuildState, BuildSubsystem};
use crate::platform::{PlatformFamily, PlatformInfo, Shell};

/// One statement of a command chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run a program with arguments
    Exec(Vec<String>),
    /// Create an empty file
    Touch(PathBuf),
    /// Write the exit code of the previous statement into a file
    WriteStatus(PathBuf),
}

impl Step {
    pub fn exec<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Step::Exec(argv.into_iter().map(Into::into).collect())
    }

    fn render(&self, shell: Shell) -> String {
        match self {
            Step::Exec(argv) => join_argv(shell, argv),
            Step::Touch(path) => {
                let path = path_arg(path);
                match shell {
                    Shell::Posix => format!("touch {}", shell.quote(&path)),
                    Shell::PowerShell => format!(
                        "New-Item -ItemType File -Force -Path {} | Out-Null",
                        shell.quote(&path)
                    ),
                }
            }
            Step::WriteStatus(path) => {
                // The status is captured before anything else runs, and the
                // directory may not exist if configuration never started.
                let dir = path_arg(path.parent().unwrap_or(Path::new(".")));
                let path = path_arg(path);
                match shell {
                    Shell::Posix => format!(
                        "s=$?; mkdir -p {}; echo $s > {}",
                        shell.quote(&dir),
                        shell.quote(&path)
                    ),
                    Shell::PowerShell => format!(
                        "$s = if ($?) {{ 0 }} elseif ($LASTEXITCODE) {{ $LASTEXITCODE }} else {{ 1 }}; \
                         New-Item -ItemType Directory -Force -Path {} | Out-Null; \
                         Set-Content -Path {} -Value $s",
                        shell.quote(&dir),
                        shell.quote(&path)
                    ),
                }
            }
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn join_argv(shell: Shell, argv: &[String]) -> String {
    let line = argv
        .iter()
        .map(|arg| shell.quote(arg))
        .collect::<Vec<_>>()
        .join(" ");
    // PowerShell treats a leading quoted string as a value, not a command.
    match (shell, line.starts_with('\'')) {
        (Shell::PowerShell, true) => format!("& {}", line),
        _ => line,
    }
}

/// Ordered statements plus an optional trailer that runs unconditionally
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandChain {
    stages: Vec<Step>,
    finally: Option<Step>,
}

impl CommandChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: Step) -> Self {
        self.stages.push(step);
        self
    }

    pub fn finally(mut self, step: Step) -> Self {
        self.finally = Some(step);
        self
    }

    pub fn stages(&self) -> &[Step] {
        &self.stages
    }

    /// Render for the given platform: stages joined by the platform
    /// separator, the trailer appended with `;` so it always runs.
    pub fn render(&self, platform: &PlatformInfo) -> String {
        let shell = platform.shell();
        let separator = format!(" {} ", platform.separator());
        let mut line = self
            .stages
            .iter()
            .map(|step| step.render(shell))
            .collect::<Vec<_>>()
            .join(&separator);

        if let Some(step) = &self.finally {
            if !line.is_empty() {
                line.push_str(" ; ");
            }
            line.push_str(&step.render(shell));
        }
        line
    }
}

/// Directory name of the build tree, relative to the workspace root
pub const BUILD_DIR_NAME: &str = "build";

/// `cmake -G <generator> -B build -D CMAKE_BUILD_TYPE=<variant>`
pub fn configure_step(state: &BuildState, platform: &PlatformInfo) -> Step {
    let generator = match (state.subsystem, platform.family) {
        (BuildSubsystem::Ninja, _) => "Ninja",
        (BuildSubsystem::Make, PlatformFamily::Windows) => "MinGW Makefiles",
        (BuildSubsystem::Make, _) => "Unix Makefiles",
    };
    Step::exec([
        "cmake".to_string(),
        "-G".to_string(),
        generator.to_string(),
        "-B".to_string(),
        BUILD_DIR_NAME.to_string(),
        "-D".to_string(),
        format!("CMAKE_BUILD_TYPE={}", state.variant),
    ])
}

/// Invoke the backend selected by the subsystem on the build tree.
pub fn backend_step(state: &BuildState, platform: &PlatformInfo) -> Step {
    let program = match (state.subsystem, platform.family) {
        (BuildSubsystem::Ninja, _) => "ninja",
        (BuildSubsystem::Make, PlatformFamily::Windows) => "mingw32-make",
        (BuildSubsystem::Make, _) => "make",
    };
    Step::exec([program, "-C", BUILD_DIR_NAME])
}
