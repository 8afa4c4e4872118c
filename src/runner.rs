use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunnerFailure {
    #[error("query still running after {0:?}; abandoned")]
    Timeout(Duration),
    #[error("failed to launch {program}: {reason}")]
    LaunchError { program: String, reason: String },
    #[error("query failed ({status}): {stderr}")]
    NonZeroOrSignaled { status: String, stderr: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: PathBuf,
    timeout: Duration,
}

impl ProcessRunner {
    pub fn new(shell: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            shell: shell.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Waits at most the configured timeout. A process still running at the
    /// deadline is left alone, not killed.
    pub async fn run(&self, repository: &Path, query: &str) -> Result<CapturedOutput, RunnerFailure> {
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(query)
            .current_dir(repository)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| RunnerFailure::LaunchError {
                program: self.shell.display().to_string(),
                reason: e.to_string(),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(RunnerFailure::NonZeroOrSignaled {
                    status: "wait failed".to_string(),
                    stderr: e.to_string(),
                })
            }
            Err(_) => return Err(RunnerFailure::Timeout(self.timeout)),
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(RunnerFailure::NonZeroOrSignaled {
                status: output.status.to_string(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!("stderr from {}: {}", repository.display(), stderr);
        }

        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}
