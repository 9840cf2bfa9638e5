//! Process seams used by detection and installation.
//!
//! [`ProcessProbe`] launches a tool to see whether it is reachable;
//! [`CommandRunner`] runs a package manager command to completion. Both are
//! traits so the provisioning flow can be exercised without touching the
//! host's package database.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// How a launched process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchResult {
    /// The process started and exited by itself
    Exited { success: bool },
    /// It could not be started, or had to be killed
    Failed(String),
}

#[async_trait]
pub trait ProcessProbe: Send + Sync {
    async fn launch(&self, program: &str, args: &[&str]) -> LaunchResult;
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` to completion. `stdin` is written as one line and the
    /// pipe closed. Returns a short reason on failure.
    async fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<(), String>;
}

fn resolve(program: &str) -> Result<PathBuf, String> {
    which::which(program).map_err(|_| format!("{} not found in PATH", program))
}

/// Probes tools on the host, killing any that outlive `timeout`
#[derive(Debug, Clone)]
pub struct SystemProbe {
    timeout: Duration,
}

impl SystemProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ProcessProbe for SystemProbe {
    async fn launch(&self, program: &str, args: &[&str]) -> LaunchResult {
        let path = match resolve(program) {
            Ok(path) => path,
            Err(reason) => return LaunchResult::Failed(reason),
        };

        let status = Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(self.timeout, status).await {
            Ok(Ok(status)) => {
                tracing::debug!(program, code = ?status.code(), "probe finished");
                LaunchResult::Exited {
                    success: status.success(),
                }
            }
            Ok(Err(e)) => LaunchResult::Failed(e.to_string()),
            Err(_) => {
                tracing::warn!(program, timeout = ?self.timeout, "probe timed out");
                LaunchResult::Failed(format!("no response within {:?}", self.timeout))
            }
        }
    }
}

/// Runs install commands on the host
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String], stdin: Option<&str>) -> Result<(), String> {
        let path = resolve(program)?;
        tracing::debug!(program, ?args, with_stdin = stdin.is_some(), "running command");

        let mut child = Command::new(&path)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("failed to start {}: {}", program, e))?;

        if let Some(input) = stdin
            && let Some(mut pipe) = child.stdin.take()
        {
            let mut line = input.as_bytes().to_vec();
            line.push(b'\n');
            let written = pipe.write_all(&line).await;
            line.fill(0);
            written.map_err(|e| format!("failed to write to {}: {}", program, e))?;
        }

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| e.to_string())?,
            Err(_) => return Err(format!("{} did not finish within {:?}", program, self.timeout)),
        };

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last = stderr.lines().rev().find(|l| !l.trim().is_empty());
        Err(match last {
            Some(line) => format!("{} ({})", line.trim(), output.status),
            None => format!("{} exited with {}", program, output.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probe_missing_program_fails() {
        let probe = SystemProbe::new(Duration::from_secs(5));
        let result = probe.launch("definitely-not-a-real-tool-xyz", &["--version"]).await;
        assert!(matches!(result, LaunchResult::Failed(_)));
    }

    #[tokio::test]
    async fn test_probe_present_program() {
        let probe = SystemProbe::new(Duration::from_secs(30));
        let result = probe.launch("cargo", &["--version"]).await;
        assert_eq!(result, LaunchResult::Exited { success: true });
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_kills_program_that_hangs() {
        let probe = SystemProbe::new(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let result = probe.launch("sh", &["-c", "sleep 5"]).await;
        assert!(matches!(result, LaunchResult::Failed(_)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runner_writes_stdin_and_reports_failure() {
        let runner = SystemRunner::new(Duration::from_secs(30));
        runner
            .run("sh", &["-c".into(), "read line; test \"$line\" = secret".into()], Some("secret"))
            .await
            .unwrap();

        let err = runner
            .run("sh", &["-c".into(), "echo broken >&2; exit 3".into()], None)
            .await
            .unwrap_err();
        assert!(err.contains("broken"));
    }
}
