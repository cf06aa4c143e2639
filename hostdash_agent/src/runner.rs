//! External diagnostic commands (`df`, `nvidia-smi`) with a hard wall-clock
//! timeout. A timed-out child is killed and reaped when its future is dropped.

use crate::error::{MetricError, MetricResult};
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Seam between collectors and the processes they spawn, so tests can feed
/// canned tool output.
pub trait CommandRunner: Send + Sync {
    /// Run `program args...`, returning stdout on a zero exit status.
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = MetricResult<String>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> impl Future<Output = MetricResult<String>> + Send {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        let program = program.to_string();
        async move {
            let output = match tokio::time::timeout(timeout, cmd.output()).await {
                Ok(Ok(out)) => out,
                Ok(Err(e)) => return Err(MetricError::from_io(&program, &e)),
                Err(_) => {
                    debug!(%program, ?timeout, "command timed out, killed");
                    return Err(MetricError::Timeout {
                        program,
                        secs: timeout.as_secs(),
                    });
                }
            };
            if !output.status.success() {
                return Err(MetricError::NonZeroExit {
                    program,
                    code: output.status.code().unwrap_or(-1),
                });
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let r = ProcessRunner
            .run("hostdash-no-such-tool", &[], Duration::from_secs(1))
            .await;
        assert!(matches!(r, Err(MetricError::NotFound(_))));
    }

    #[tokio::test]
    async fn captures_stdout() {
        let out = ProcessRunner
            .run("echo", &["hello"], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn non_zero_exit_reported() {
        let r = ProcessRunner.run("false", &[], Duration::from_secs(5)).await;
        assert!(matches!(r, Err(MetricError::NonZeroExit { .. })));
    }

    #[tokio::test]
    async fn hung_tool_times_out() {
        let started = std::time::Instant::now();
        let r = ProcessRunner
            .run("sleep", &["10"], Duration::from_millis(200))
            .await;
        assert!(matches!(r, Err(MetricError::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
