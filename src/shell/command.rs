//! Bounded external command execution.

use crate::error::ProbeError;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of executing an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: impl Into<String>, stderr: impl Into<String>, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration,
            success: false,
        }
    }

    /// Stdout followed by stderr, trimmed.
    ///
    /// Some system tools print their diagnostics on either stream
    /// depending on the OS build, so text matching looks at both.
    pub fn combined(&self) -> String {
        let mut text = self.stdout.trim().to_string();
        let err = self.stderr.trim();
        if !err.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(err);
        }
        text
    }
}

/// Capability to run one external program with a hard deadline.
///
/// Every probe reaches the operating system through this trait so that
/// tests can substitute canned answers for the real tools.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, killing it once `timeout` elapses.
    ///
    /// A non-zero exit status is reported through [`CommandResult`], not
    /// as an error. Errors are reserved for spawn failures and timeouts.
    fn run(&self, program: &str, args: &[String], timeout: Duration)
        -> Result<CommandResult, ProbeError>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        timeout: Duration,
    ) -> Result<CommandResult, ProbeError> {
        execute_bounded(program, args, timeout)
    }
}

/// Spawn `program` directly (no intermediate shell) and wait at most `timeout`.
pub fn execute_bounded(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandResult, ProbeError> {
    let start = Instant::now();
    tracing::trace!("exec {} {:?}", program, args);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| ProbeError::unavailable(program, e.to_string()))?;

    // Drain both pipes on their own threads so a chatty child cannot block
    // on a full pipe while we wait for it.
    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let status = match wait_with_deadline(&mut child, start, timeout) {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ProbeError::Timeout {
                operation: program.to_string(),
                after: timeout,
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    let duration = start.elapsed();

    if status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(status.code(), stdout, stderr, duration))
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn wait_with_deadline(
    child: &mut Child,
    start: Instant,
    timeout: Duration,
) -> Option<std::process::ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(_) => return None,
        }
        if start.elapsed() >= timeout {
            return None;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn combined_joins_both_streams() {
        let result = CommandResult::failure(Some(1060), " out \n", "err\n", Duration::ZERO);
        assert_eq!(result.combined(), "out\nerr");
    }

    #[test]
    fn combined_skips_empty_stderr() {
        let result = CommandResult::success("only stdout", "", Duration::ZERO);
        assert_eq!(result.combined(), "only stdout");
    }

    #[test]
    fn spawn_failure_is_source_unavailable() {
        let err = execute_bounded(
            "definitely-not-a-real-program-securecheck",
            &[],
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::SourceUnavailable);
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_of_successful_command() {
        let result =
            execute_bounded("/bin/sh", &args(&["-c", "echo hello"]), Duration::from_secs(10))
                .unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_not_an_error() {
        let result = execute_bounded(
            "/bin/sh",
            &args(&["-c", "echo nope >&2; exit 3"]),
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.contains("nope"));
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_is_killed_at_deadline() {
        let start = Instant::now();
        let err = execute_bounded(
            "/bin/sh",
            &args(&["-c", "sleep 10"]),
            Duration::from_millis(200),
        )
        .unwrap_err();
        assert!(matches!(err, ProbeError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_delegates() {
        let result = SystemRunner
            .run("/bin/sh", &args(&["-c", "printf ok"]), Duration::from_secs(10))
            .unwrap();
        assert_eq!(result.stdout, "ok");
    }
}
