//! Named terminals that build, run and debug commands are sent to.
//!
//! A terminal accepts command lines and executes them in submission order,
//! in the background. Callers never get an exit status back; the build
//! chain signals completion through the marker file instead.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use crate::platform::Shell;

pub trait Terminal: Send {
    fn name(&self) -> &str;

    /// Queue a command line for execution.
    fn send_text(&mut self, line: &str) -> Result<(), String>;

    /// Stop accepting lines and wait for queued ones to finish.
    fn close(self: Box<Self>) {}
}

pub trait TerminalFactory: Send {
    fn create(&self, name: &str) -> Box<dyn Terminal>;
}

/// Open terminals, at most one per name
pub struct Terminals {
    factory: Box<dyn TerminalFactory>,
    open: Vec<Box<dyn Terminal>>,
}

impl Terminals {
    pub fn new(factory: Box<dyn TerminalFactory>) -> Self {
        Self {
            factory,
            open: Vec::new(),
        }
    }

    /// Terminals backed by the platform shell, running in `cwd`.
    pub fn shell(shell: Shell, cwd: &Path) -> Self {
        Self::new(Box::new(ShellTerminalFactory {
            shell,
            cwd: cwd.to_path_buf(),
        }))
    }

    /// Reuse the terminal called `name`, creating it on first use.
    pub fn find_or_create(&mut self, name: &str) -> &mut dyn Terminal {
        let index = match self.open.iter().position(|t| t.name() == name) {
            Some(index) => index,
            None => {
                tracing::debug!(terminal = name, "opening terminal");
                self.open.push(self.factory.create(name));
                self.open.len() - 1
            }
        };
        self.open[index].as_mut()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Close every terminal, blocking until their queued lines have run.
    pub fn close_all(self) {
        for terminal in self.open {
            terminal.close();
        }
    }
}

struct ShellTerminalFactory {
    shell: Shell,
    cwd: PathBuf,
}

impl TerminalFactory for ShellTerminalFactory {
    fn create(&self, name: &str) -> Box<dyn Terminal> {
        Box::new(ShellTerminal::spawn(name, self.shell, self.cwd.clone()))
    }
}

/// Runs lines one after another through the platform shell on a worker
/// thread. Output goes straight to the user's console.
pub struct ShellTerminal {
    name: String,
    tx: Sender<String>,
    worker: JoinHandle<()>,
}

impl ShellTerminal {
    pub fn spawn(name: &str, shell: Shell, cwd: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel::<String>();
        let terminal_name = name.to_string();

        let worker = thread::spawn(move || {
            let (program, leading) = shell.invocation();
            while let Ok(line) = rx.recv() {
                let status = Command::new(program)
                    .args(leading)
                    .arg(&line)
                    .current_dir(&cwd)
                    .status();
                match status {
                    Ok(status) => {
                        tracing::debug!(terminal = %terminal_name, code = ?status.code(), "command finished")
                    }
                    Err(e) => {
                        tracing::warn!(terminal = %terminal_name, error = %e, "failed to start shell")
                    }
                }
            }
        });

        Self {
            name: name.to_string(),
            tx,
            worker,
        }
    }
}

impl Terminal for ShellTerminal {
    fn name(&self) -> &str {
        &self.name
    }

    fn send_text(&mut self, line: &str) -> Result<(), String> {
        tracing::debug!(terminal = %self.name, line, "sending command");
        self.tx
            .send(line.to_string())
            .map_err(|_| "terminal worker has exited".to_string())
    }

    fn close(self: Box<Self>) {
        let ShellTerminal { name, tx, worker } = *self;
        drop(tx);
        if worker.join().is_err() {
            tracing::warn!(terminal = %name, "terminal worker panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Log(Arc<Mutex<Vec<(String, String)>>>);

    struct Recording {
        name: String,
        log: Log,
    }

    impl Terminal for Recording {
        fn name(&self) -> &str {
            &self.name
        }

        fn send_text(&mut self, line: &str) -> Result<(), String> {
            self.log.0.lock().unwrap().push((self.name.clone(), line.to_string()));
            Ok(())
        }
    }

    struct RecordingFactory(Log);

    impl TerminalFactory for RecordingFactory {
        fn create(&self, name: &str) -> Box<dyn Terminal> {
            Box::new(Recording {
                name: name.to_string(),
                log: self.0.clone(),
            })
        }
    }

    #[test]
    fn test_terminals_are_reused_by_name() {
        let log = Log::default();
        let mut terminals = Terminals::new(Box::new(RecordingFactory(log.clone())));

        terminals.find_or_create("CMake Build").send_text("one").unwrap();
        terminals.find_or_create("CMake Build").send_text("two").unwrap();
        terminals.find_or_create("CMake Run").send_text("three").unwrap();

        assert_eq!(terminals.len(), 2);
        let sent = log.0.lock().unwrap();
        assert_eq!(sent[0], ("CMake Build".to_string(), "one".to_string()));
        assert_eq!(sent[1], ("CMake Build".to_string(), "two".to_string()));
        assert_eq!(sent[2], ("CMake Run".to_string(), "three".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_terminal_runs_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut terminal = ShellTerminal::spawn("t", Shell::Posix, dir.path().to_path_buf());

        terminal.send_text("echo first > out.txt").unwrap();
        terminal.send_text("echo second >> out.txt").unwrap();
        Box::new(terminal).close();

        let out = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
        assert_eq!(out, "first\nsecond\n");
    }
}
