//! Subprocess driver: the only place a child process is ever spawned.
//!
//! Two operations with deliberately different contracts. `compile` has no
//! deadline and no stdin; build steps are assumed bounded by the
//! environment. `run` feeds stdin, captures both streams, and enforces a
//! wall-clock deadline after which the child is killed.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Exit code the kernel reports for a SIGKILLed child, which in a
/// memory-limited deployment usually means the OOM killer fired.
const SIGKILL_EXIT_CODE: i32 = 137;

/// Captured streams and status of a child that ran to completion.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Failure of a compile step.
#[derive(Debug, Error)]
pub enum CompileFailure {
    /// The tool ran and rejected the input; stderr is the diagnostic.
    #[error("compiler exited with code {exit_code}")]
    ToolFailed { exit_code: i32, stderr: String },
    /// The tool could not be started at all. Infrastructure, not user code.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of a run step.
///
/// `NonZeroExit` still carries whatever the child wrote before dying:
/// test frameworks report failures via nonzero exit, so callers inspect
/// the streams rather than discarding them.
#[derive(Debug, Error)]
pub enum RunFailure {
    #[error("execution timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("process exited with code {exit_code}")]
    NonZeroExit {
        exit_code: i32,
        stdout: String,
        stderr: String,
        /// SIGKILL convention; see `SIGKILL_EXIT_CODE`.
        killed_by_oom: bool,
    },
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Run a build step to completion, capturing stderr.
pub async fn compile(program: &str, args: &[String], cwd: &Path) -> Result<(), CompileFailure> {
    debug!(program, ?args, cwd = %cwd.display(), "compile step");

    let output = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| CompileFailure::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }

    Err(CompileFailure::ToolFailed {
        exit_code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run a program with the given stdin under a wall-clock deadline.
///
/// The child is spawned with `kill_on_drop`, and the deadline is applied
/// with `tokio::time::timeout` around the single wait future. Exactly one
/// of "timed out" and "exited" can win: the elapsed branch drops the wait
/// future (killing the child) and whatever was captured is discarded.
pub async fn run(
    program: &str,
    args: &[String],
    cwd: &Path,
    stdin: &str,
    timeout_ms: u64,
) -> Result<ExecutionOutcome, RunFailure> {
    debug!(program, ?args, cwd = %cwd.display(), timeout_ms, "run step");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RunFailure::Spawn {
            program: program.to_string(),
            source,
        })?;

    // Write stdin and close the pipe so the child sees EOF. A child that
    // exits without reading makes this a broken pipe; that is its
    // prerogative, not an error.
    if let Some(mut pipe) = child.stdin.take() {
        let _ = pipe.write_all(stdin.as_bytes()).await;
    }

    let output = match tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        child.wait_with_output(),
    )
    .await
    {
        Ok(waited) => waited.map_err(|source| RunFailure::Wait {
            program: program.to_string(),
            source,
        })?,
        Err(_elapsed) => return Err(RunFailure::Timeout { timeout_ms }),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if output.status.success() {
        return Ok(ExecutionOutcome {
            stdout,
            stderr,
            exit_code: 0,
        });
    }

    let exit_code = output.status.code().unwrap_or(-1);
    Err(RunFailure::NonZeroExit {
        exit_code,
        stdout,
        stderr,
        killed_by_oom: exit_code == SIGKILL_EXIT_CODE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cwd() -> PathBuf {
        std::env::temp_dir()
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_run_captures_stdout() {
        let outcome = run("sh", &args(&["-c", "echo hello"]), &cwd(), "", 3000)
            .await
            .unwrap();
        assert_eq!(outcome.stdout, "hello\n");
        assert_eq!(outcome.stderr, "");
        assert_eq!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn test_run_feeds_stdin() {
        let outcome = run("cat", &[], &cwd(), "line in\n", 3000).await.unwrap();
        assert_eq!(outcome.stdout, "line in\n");
    }

    #[tokio::test]
    async fn test_run_nonzero_exit_keeps_partial_output() {
        let err = run(
            "sh",
            &args(&["-c", "echo partial; echo oops >&2; exit 3"]),
            &cwd(),
            "",
            3000,
        )
        .await
        .unwrap_err();

        match err {
            RunFailure::NonZeroExit {
                exit_code,
                stdout,
                stderr,
                killed_by_oom,
            } => {
                assert_eq!(exit_code, 3);
                assert_eq!(stdout, "partial\n");
                assert_eq!(stderr, "oops\n");
                assert!(!killed_by_oom);
            }
            other => panic!("expected NonZeroExit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_enforces_deadline() {
        let started = std::time::Instant::now();
        let err = run("sh", &args(&["-c", "sleep 30"]), &cwd(), "", 200)
            .await
            .unwrap_err();

        assert!(matches!(err, RunFailure::Timeout { timeout_ms: 200 }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_spawn_failure_is_distinct() {
        let err = run("/nonexistent/binary", &[], &cwd(), "", 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, RunFailure::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_compile_failure_carries_stderr() {
        let err = compile("sh", &args(&["-c", "echo 'bad: token' >&2; exit 1"]), &cwd())
            .await
            .unwrap_err();
        match err {
            CompileFailure::ToolFailed { exit_code, stderr } => {
                assert_eq!(exit_code, 1);
                assert_eq!(stderr, "bad: token\n");
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_compile_success() {
        compile("true", &[], &cwd()).await.unwrap();
    }

    #[tokio::test]
    async fn test_compile_spawn_failure_is_distinct() {
        let err = compile("/nonexistent/compiler", &[], &cwd())
            .await
            .unwrap_err();
        assert!(matches!(err, CompileFailure::Spawn { .. }));
    }
}
