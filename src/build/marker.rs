//! Completion marker protocol.
//!
//! The build chain runs in a terminal whose exit status is not observable
//! here, so its last statement creates a file under the build directory.
//! The orchestrator removes any stale marker before dispatching, polls for
//! the marker afterwards, and removes it again once seen.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use super::error::BuildError;
use crate::config::MarkerMode;

pub const MARKER_FILE_NAME: &str = "z_build_complete";

/// What the marker told us once it appeared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSignal {
    /// Presence-only marker: the chain reached its last statement
    Present,
    /// Status marker: exit code of the build stages
    Exit(i32),
}

impl MarkerSignal {
    pub fn succeeded(&self) -> bool {
        matches!(self, MarkerSignal::Present | MarkerSignal::Exit(0))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
    pub mode: MarkerMode,
}

#[derive(Debug, Clone)]
pub struct BuildMarker {
    path: PathBuf,
}

impl BuildMarker {
    pub fn in_dir(build_dir: &Path) -> Self {
        Self {
            path: build_dir.join(MARKER_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Poll until the marker appears, the timeout elapses or `cancel` fires.
    pub async fn wait(
        &self,
        policy: &WaitPolicy,
        cancel: &CancellationToken,
    ) -> Result<MarkerSignal, BuildError> {
        let started = Instant::now();
        loop {
            if let Some(signal) = self.read_signal(policy.mode).await? {
                tracing::debug!(?signal, elapsed = ?started.elapsed(), "build marker observed");
                return Ok(signal);
            }

            if let Some(limit) = policy.timeout
                && started.elapsed() >= limit
            {
                return Err(BuildError::Timeout(limit));
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(BuildError::Cancelled),
                _ = tokio::time::sleep(policy.poll_interval) => {}
            }
        }
    }

    async fn read_signal(&self, mode: MarkerMode) -> Result<Option<MarkerSignal>, BuildError> {
        match mode {
            MarkerMode::Presence => {
                let present = tokio::fs::try_exists(&self.path).await.unwrap_or(false);
                Ok(present.then_some(MarkerSignal::Present))
            }
            MarkerMode::Status => match tokio::fs::read_to_string(&self.path).await {
                Ok(content) => Ok(parse_status(&content)),
                Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                    Ok(None)
                }
                Err(e) => Err(e.into()),
            },
        }
    }

    /// Remove the marker, tolerating a backend that still holds the file.
    ///
    /// Makes `retries + 1` attempts `delay` apart. A missing marker counts
    /// as removed.
    pub async fn remove(&self, retries: u32, delay: Duration) -> Result<(), BuildError> {
        let attempts = retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match tokio::fs::remove_file(&self.path).await {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
                Err(e) if attempt >= attempts => {
                    return Err(BuildError::MarkerBusy {
                        path: self.path.clone(),
                        attempts,
                        source: e,
                    });
                }
                Err(e) => {
                    tracing::debug!(attempt, error = %e, "marker busy, retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// An empty file is still being written; anything unparseable is a failure.
fn parse_status(content: &str) -> Option<MarkerSignal> {
    let trimmed = content.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if trimmed.is_empty() {
        return None;
    }
    Some(MarkerSignal::Exit(trimmed.parse().unwrap_or(-1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(mode: MarkerMode, timeout: Option<Duration>) -> WaitPolicy {
        WaitPolicy {
            poll_interval: Duration::from_millis(10),
            timeout,
            mode,
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(""), None);
        assert_eq!(parse_status("0\n"), Some(MarkerSignal::Exit(0)));
        assert_eq!(parse_status("\u{feff}2\r\n"), Some(MarkerSignal::Exit(2)));
        assert_eq!(parse_status("garbage"), Some(MarkerSignal::Exit(-1)));
        assert!(MarkerSignal::Exit(0).succeeded());
        assert!(!MarkerSignal::Exit(1).succeeded());
    }

    #[tokio::test]
    async fn test_wait_sees_marker_written_later() {
        let dir = tempfile::tempdir().unwrap();
        let marker = BuildMarker::in_dir(dir.path());
        let path = marker.path().to_path_buf();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tokio::fs::write(path, b"").await.unwrap();
        });

        let signal = marker
            .wait(&policy(MarkerMode::Presence, Some(Duration::from_secs(5))), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(signal, MarkerSignal::Present);
    }

    #[tokio::test]
    async fn test_wait_reads_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let marker = BuildMarker::in_dir(dir.path());
        std::fs::write(marker.path(), "1\n").unwrap();

        let signal = marker
            .wait(&policy(MarkerMode::Status, None), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(signal, MarkerSignal::Exit(1));
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let marker = BuildMarker::in_dir(dir.path());

        let err = marker
            .wait(
                &policy(MarkerMode::Presence, Some(Duration::from_millis(40))),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_wait_is_cancellable() {
        let dir = tempfile::tempdir().unwrap();
        let marker = BuildMarker::in_dir(dir.path());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            trigger.cancel();
        });

        let err = marker
            .wait(&policy(MarkerMode::Presence, None), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Cancelled));
    }

    #[tokio::test]
    async fn test_remove_missing_marker_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let marker = BuildMarker::in_dir(dir.path());
        marker.remove(0, Duration::ZERO).await.unwrap();
        marker.remove(u32::MAX, Duration::ZERO).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_gives_up_after_retries() {
        let dir = tempfile::tempdir().unwrap();
        let marker = BuildMarker::in_dir(dir.path());
        // A directory in the marker's place cannot be unlinked.
        std::fs::create_dir(marker.path()).unwrap();

        let err = marker.remove(2, Duration::from_millis(1)).await.unwrap_err();
        match err {
            BuildError::MarkerBusy { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
