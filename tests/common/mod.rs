//! Fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use ctoolkit::build::{Terminal, TerminalFactory, Workspace};
use ctoolkit::config::CtkConfig;
use ctoolkit::toolchain::{CommandRunner, LaunchResult, ProcessProbe};
use ctoolkit::ui::{Notifier, Prompter};

/// A project directory with (optionally) a CMakeLists.txt
pub fn project(name: &str, with_script: bool) -> (tempfile::TempDir, Workspace) {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().join(name);
    fs::create_dir(&root).unwrap();
    if with_script {
        fs::write(root.join("CMakeLists.txt"), "project(app)\n").unwrap();
    }
    let workspace = Workspace::open(&root).unwrap();
    (parent, workspace)
}

/// Defaults with short delays so the tests run quickly
pub fn fast_config() -> CtkConfig {
    let mut config = CtkConfig::default();
    config.build.poll_interval_ms = 10;
    config.build.timeout_secs = 10;
    config.build.marker_delete_delay_ms = 5;
    config.test.settle_delay_ms = 0;
    config
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<(&'static str, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count(&self, level: &str) -> usize {
        self.all().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(("info", message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(("warn", message.to_string()));
    }

    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(("error", message.to_string()));
    }
}

/// What the simulated build does once the chain arrives
#[derive(Clone, Default)]
pub struct BuildScript {
    /// Contents written to the marker; `None` never writes it
    pub marker: Option<String>,
    /// Also produce the executable
    pub executable: bool,
}

#[derive(Debug, Clone)]
pub struct Sent {
    pub terminal: String,
    pub line: String,
    /// Whether the completion marker existed when the line arrived
    pub marker_present: bool,
}

#[derive(Clone)]
pub struct FakeTerminals {
    pub sent: Arc<Mutex<Vec<Sent>>>,
    pub created: Arc<Mutex<Vec<String>>>,
    workspace: Workspace,
    executable: PathBuf,
    script: BuildScript,
}

impl FakeTerminals {
    pub fn new(workspace: &Workspace, script: BuildScript) -> Self {
        let platform = ctoolkit::platform::PlatformInfo::detect().unwrap();
        Self {
            sent: Arc::default(),
            created: Arc::default(),
            workspace: workspace.clone(),
            executable: workspace.executable(&platform),
            script,
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, terminal: &str) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.terminal == terminal).collect()
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

struct FakeTerminal {
    name: String,
    owner: FakeTerminals,
}

impl Terminal for FakeTerminal {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_text(&mut self, line: &str) -> Result<(), String> {
        let marker = self.owner.workspace.marker().path().to_path_buf();
        self.owner.sent.lock().unwrap().push(Sent {
            terminal: self.name.clone(),
            line: line.to_string(),
            marker_present: marker.exists(),
        });

        if self.name == "CMake Build" {
            let build_dir = self.owner.workspace.build_dir();
            let executable = self.owner.executable.clone();
            let script = self.owner.script.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                fs::create_dir_all(&build_dir).unwrap();
                if script.executable {
                    fs::write(&executable, b"").unwrap();
                }
                if let Some(content) = script.marker {
                    fs::write(&marker, content).unwrap();
                }
            });
        }
        Ok(())
    }
}

impl TerminalFactory for FakeTerminals {
    fn create(&self, name: &str) -> Box<dyn Terminal> {
        self.created.lock().unwrap().push(name.to_string());
        Box::new(FakeTerminal {
            name: name.to_string(),
            owner: self.clone(),
        })
    }
}

/// Answers prompts from a script
#[derive(Default)]
pub struct ScriptedPrompter {
    pub choice: Option<usize>,
    pub confirm: bool,
    pub passwords: Mutex<VecDeque<String>>,
    pub confirmations: Mutex<Vec<String>>,
    pub selects: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn choosing(choice: Option<usize>, confirm: bool) -> Self {
        Self {
            choice,
            confirm,
            ..Self::default()
        }
    }

    pub fn with_passwords(passwords: &[&str]) -> Self {
        Self {
            passwords: Mutex::new(passwords.iter().map(|p| p.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().unwrap().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn select(&self, _title: &str, options: &[String]) -> Option<usize> {
        self.selects.lock().unwrap().push(options.to_vec());
        self.choice
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirmations.lock().unwrap().push(message.to_string());
        self.confirm
    }

    fn password(&self, _message: &str) -> Option<String> {
        self.passwords.lock().unwrap().pop_front()
    }
}

/// Reports the listed programs as missing, everything else as present
pub struct FakeProbe {
    pub missing: Vec<String>,
}

#[async_trait]
impl ProcessProbe for FakeProbe {
    async fn launch(&self, program: &str, _args: &[&str]) -> LaunchResult {
        if self.missing.iter().any(|m| m == program) {
            LaunchResult::Failed(format!("{} not found in PATH", program))
        } else {
            LaunchResult::Exited { success: true }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

/// Records calls. Fails any call whose arguments mention `fail_on`, and
/// rejects credentials other than `password`.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<Call>>,
    pub fail_on: Option<String>,
    pub password: Option<String>,
}

impl FakeRunner {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<(), String> {
        self.calls.lock().unwrap().push(Call {
            program: program.to_string(),
            args: args.to_vec(),
            stdin: stdin.map(str::to_string),
        });

        if let Some(expected) = &self.password
            && stdin.is_some()
            && stdin != Some(expected.as_str())
        {
            return Err("incorrect password".to_string());
        }
        if let Some(needle) = &self.fail_on
            && args.iter().any(|a| a == needle)
        {
            return Err(format!("E: Unable to locate package {}", needle));
        }
        Ok(())
    }
}
