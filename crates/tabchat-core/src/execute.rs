//! Execution sink for model-generated code.
//!
//! Routing untrusted model output to an interpreter is a security boundary,
//! not a convenience: the capability is an explicit seam, disabled unless
//! the operator opts in, and nothing here sandboxes what runs. Execution
//! failures are reported and the session continues.

use crate::{Result, TabchatError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

/// Accepts a string of program text and executes it.
#[async_trait]
pub trait ExecutionSink: Send + Sync {
    /// Execute `code`, returning its combined output.
    async fn execute(&self, code: &str) -> Result<String>;

    /// Whether this sink will actually run anything.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// The default sink: refuses everything.
pub struct DisabledSink;

#[async_trait]
impl ExecutionSink for DisabledSink {
    async fn execute(&self, _code: &str) -> Result<String> {
        Err(TabchatError::ExecutionFailure(
            "code execution is disabled on this server".to_string(),
        ))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Pipes code to a configured interpreter process over stdin.
pub struct ProcessSink {
    command: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ProcessSink {
    pub fn new(command: PathBuf, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            command,
            args,
            timeout,
        }
    }
}

#[async_trait]
impl ExecutionSink for ProcessSink {
    async fn execute(&self, code: &str) -> Result<String> {
        info!(
            target: "tabchat::exec",
            "Executing {} bytes of model-generated code via {}",
            code.len(),
            self.command.display()
        );

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TabchatError::ExecutionFailure(format!(
                    "failed to spawn {}: {}",
                    self.command.display(),
                    e
                ))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await.map_err(|e| {
                TabchatError::ExecutionFailure(format!("failed to write code: {}", e))
            })?;
            // Close stdin so the interpreter sees EOF.
            drop(stdin);
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(target: "tabchat::exec", "Execution timed out after {:?}", self.timeout);
                TabchatError::ExecutionFailure(format!(
                    "execution timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| TabchatError::ExecutionFailure(e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TabchatError::ExecutionFailure(format!(
                "exit status {}: {}",
                output.status,
                stderr.trim()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_sink_refuses() {
        let sink = DisabledSink;
        assert!(!sink.is_enabled());
        let err = sink.execute("plot(df)").await.unwrap_err();
        assert!(matches!(err, TabchatError::ExecutionFailure(_)));
    }

    #[tokio::test]
    async fn test_process_sink_runs_interpreter() {
        // `cat` echoes stdin; good enough to prove the plumbing.
        let sink = ProcessSink::new(PathBuf::from("cat"), vec![], Duration::from_secs(5));
        let output = sink.execute("plot(df)").await.unwrap();
        assert_eq!(output, "plot(df)");
    }

    #[tokio::test]
    async fn test_process_sink_surfaces_failure() {
        let sink = ProcessSink::new(
            PathBuf::from("/nonexistent/interpreter"),
            vec![],
            Duration::from_secs(5),
        );
        let err = sink.execute("plot(df)").await.unwrap_err();
        assert!(matches!(err, TabchatError::ExecutionFailure(_)));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let sink = ProcessSink::new(
            PathBuf::from("sh"),
            vec!["-c".to_string(), "exit 3".to_string()],
            Duration::from_secs(5),
        );
        let err = sink.execute("ignored").await.unwrap_err();
        assert!(matches!(err, TabchatError::ExecutionFailure(_)));
    }
}
