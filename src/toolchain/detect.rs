use futures::future::join_all;
use std::collections::BTreeMap;
use std::time::Duration;

use super::process::{LaunchResult, ProcessProbe};
use super::types::{ProbeStyle, ToolCheckResult, ToolSpec};

/// Decides whether tools are reachable on `PATH`.
///
/// Never fails: anything that keeps a tool from launching counts as
/// unavailable, including a probe that outlives the timeout.
pub struct AvailabilityChecker<P> {
    probe: P,
    timeout: Option<Duration>,
}

impl<P: ProcessProbe> AvailabilityChecker<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            timeout: None,
        }
    }

    /// Give up on any single check after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub async fn is_available(&self, name: &str) -> bool {
        self.check(&ToolSpec::new(name)).await
    }

    pub async fn check(&self, tool: &ToolSpec) -> bool {
        let args: &[&str] = match tool.probe {
            ProbeStyle::VersionFlag => &["--version"],
            ProbeStyle::BareLaunch => &[],
        };
        let launch = self.probe.launch(&tool.name, args);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, launch)
                .await
                .unwrap_or_else(|_| LaunchResult::Failed(format!("no response within {:?}", limit))),
            None => launch.await,
        };
        match (tool.probe, result) {
            (ProbeStyle::VersionFlag, LaunchResult::Exited { success }) => success,
            (ProbeStyle::BareLaunch, LaunchResult::Exited { .. }) => true,
            (_, LaunchResult::Failed(reason)) => {
                tracing::debug!(tool = %tool.name, %reason, "tool unavailable");
                false
            }
        }
    }

    /// Probe every name concurrently.
    pub async fn check_all(&self, names: &[String]) -> BTreeMap<String, bool> {
        let results = join_all(names.iter().map(|name| self.is_available(name))).await;
        names.iter().cloned().zip(results).collect()
    }

    pub async fn check_specs(&self, tools: &[ToolSpec]) -> Vec<ToolCheckResult> {
        let results = join_all(tools.iter().map(|tool| self.check(tool))).await;
        tools
            .iter()
            .cloned()
            .zip(results)
            .map(|(tool, available)| ToolCheckResult { tool, available })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// `present` exits 0, `bare` starts but exits non-zero, `hangs` never
    /// returns, anything else cannot be spawned.
    struct FakeProbe;

    #[async_trait]
    impl ProcessProbe for FakeProbe {
        async fn launch(&self, program: &str, _args: &[&str]) -> LaunchResult {
            match program {
                "present" => LaunchResult::Exited { success: true },
                "bare" => LaunchResult::Exited { success: false },
                "hangs" => std::future::pending().await,
                _ => LaunchResult::Failed("No such file or directory".into()),
            }
        }
    }

    #[tokio::test]
    async fn test_check_all_maps_every_name() {
        let checker = AvailabilityChecker::new(FakeProbe);
        let result = checker
            .check_all(&["present".to_string(), "missing".to_string()])
            .await;
        assert_eq!(result.len(), 2);
        assert!(result["present"]);
        assert!(!result["missing"]);
    }

    #[tokio::test]
    async fn test_hanging_check_does_not_block_the_others() {
        let checker = AvailabilityChecker::new(FakeProbe).with_timeout(Duration::from_millis(50));
        let result = checker
            .check_all(&["hangs".to_string(), "present".to_string(), "missing".to_string()])
            .await;
        assert_eq!(result.len(), 3);
        assert!(!result["hangs"]);
        assert!(result["present"]);
        assert!(!result["missing"]);
    }

    #[tokio::test]
    async fn test_bare_launch_ignores_exit_status() {
        let checker = AvailabilityChecker::new(FakeProbe);
        let bare = ToolSpec::new("bare");
        assert!(!checker.check(&bare).await);
        assert!(checker.check(&bare.with_probe(ProbeStyle::BareLaunch)).await);
    }
}
