//! External command execution with an enforced timeout.
//!
//! Every OS tool the scanners and the terminator rely on goes through
//! [`CommandRunner::run`]. Output is captured in memory while the child runs,
//! and a child that outlives its timeout is killed together with everything it
//! spawned.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Extra time granted to the output readers once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Absolute path so PATH lookup can never pick a different taskkill.
#[cfg_attr(not(windows), allow(dead_code))]
pub(crate) const TASKKILL: &str = r"C:\Windows\System32\taskkill.exe";

/// Exit code and captured output of one external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Exit code, or -1 when the OS reported none (killed by a signal).
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// Whether the command was killed because it exceeded its timeout.
    pub timed_out: bool,
}

impl CommandResult {
    /// Exited on its own with status 0.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == 0
    }
}

/// Runs external programs without a shell, capturing stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

impl CommandRunner {
    /// Create a new command runner.
    pub fn new() -> Self {
        Self
    }

    /// Run `program` with `args`, returning once it exits or `timeout` elapses.
    ///
    /// On timeout the whole process tree is killed; kill failures are ignored
    /// because the child may have exited in the meantime. Exit codes are not
    /// interpreted.
    ///
    /// # Errors
    ///
    /// [`Error::LaunchFailed`] when the program cannot be started.
    pub async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<CommandResult> {
        debug!(
            program = program,
            ?args,
            timeout_ms = timeout.as_millis() as u64,
            "Running command"
        );

        let started = std::time::Instant::now();

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group, so a timeout can take down grandchildren too.
        #[cfg(unix)]
        command.process_group(0);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        let mut child = command.spawn().map_err(|source| Error::LaunchFailed {
            program: program.to_string(),
            source,
        })?;

        let mut stdout = child.stdout.take().map(spawn_reader);
        let mut stderr = child.stderr.take().map(spawn_reader);

        let (exit_code, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => (status.code().unwrap_or(-1), false),
            Ok(Err(e)) => {
                kill_tree(&mut child).await;
                return Err(Error::Io(e));
            }
            Err(_) => {
                warn!(
                    program = program,
                    timeout_ms = timeout.as_millis() as u64,
                    "Command timed out, killing process tree"
                );
                kill_tree(&mut child).await;
                let code = match tokio::time::timeout(DRAIN_GRACE, child.wait()).await {
                    Ok(Ok(status)) => status.code().unwrap_or(-1),
                    _ => -1,
                };
                (code, true)
            }
        };

        // A detached grandchild may still hold the pipes open; never wait past the deadline for it.
        let drain_limit = timeout.saturating_sub(started.elapsed()).max(DRAIN_GRACE);
        let stdout = collect(stdout.as_mut(), drain_limit).await;
        let stderr = collect(stderr.as_mut(), drain_limit).await;

        debug!(program = program, exit_code = exit_code, timed_out = timed_out, "Command finished");

        Ok(CommandResult {
            exit_code,
            stdout,
            stderr,
            timed_out,
        })
    }
}

fn spawn_reader<R>(mut reader: R) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        // Bytes read before an error stay in `buf`.
        let _ = reader.read_to_end(&mut buf).await;
        buf
    })
}

async fn collect(reader: Option<&mut JoinHandle<Vec<u8>>>, limit: Duration) -> String {
    let Some(handle) = reader else {
        return String::new();
    };

    match tokio::time::timeout(limit, &mut *handle).await {
        Ok(Ok(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
        Ok(Err(e)) => {
            debug!(error = %e, "Output reader task failed");
            String::new()
        }
        Err(_) => {
            warn!("Output still open after the command finished, abandoning it");
            handle.abort();
            String::new()
        }
    }
}

/// Best-effort kill of the child and its descendants.
async fn kill_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Ok(raw) = i32::try_from(pid) {
                if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
                    debug!(pid = pid, error = %e, "Process group kill failed");
                }
            }
        }

        #[cfg(windows)]
        {
            let pid = pid.to_string();
            let status = Command::new(TASKKILL)
                .args(["/PID", pid.as_str(), "/T", "/F"])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .creation_flags(CREATE_NO_WINDOW)
                .status();
            match tokio::time::timeout(DRAIN_GRACE * 6, status).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => debug!(pid = %pid, error = %e, "taskkill /T /F failed"),
                Err(_) => debug!(pid = %pid, "taskkill /T /F timed out"),
            }
        }
    }

    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Child kill failed, it has probably exited");
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_captures_output_and_exit_code() {
        let runner = CommandRunner::new();
        let result = runner
            .run("sh", &["-c", "echo hello; echo oops >&2; exit 3"], Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.stderr, "oops\n");
        assert!(!result.timed_out);
        assert!(!result.success());
    }

    #[tokio::test]
    async fn test_large_output_does_not_deadlock() {
        let runner = CommandRunner::new();
        let result = runner
            .run(
                "sh",
                &["-c", "head -c 200000 /dev/zero | tr '\\000' a"],
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout.len(), 200_000);
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let runner = CommandRunner::new();
        let started = std::time::Instant::now();
        let result = runner
            .run("sleep", &["10"], Duration::from_millis(300))
            .await
            .unwrap();

        assert!(result.timed_out);
        assert!(!result.success());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_timeout_kills_grandchildren_and_keeps_partial_output() {
        let runner = CommandRunner::new();
        let started = std::time::Instant::now();
        let script = ["-c", "echo started; sleep 10; echo never"];
        let result = runner
            .run("sh", &script, Duration::from_millis(500))
            .await
            .unwrap();

        assert!(result.timed_out);
        assert!(result.stdout.contains("started"));
        assert!(!result.stdout.contains("never"));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_unbounded_timeout() {
        let runner = CommandRunner::new();
        let result = runner.run("true", &[], Duration::MAX).await.unwrap();

        assert!(result.success());
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn test_taskkill_is_absolute() {
        assert!(TASKKILL.starts_with(r"C:\Windows\System32\"));
        assert!(TASKKILL.ends_with("taskkill.exe"));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let runner = CommandRunner::new();
        let result = runner
            .run("/definitely/not/a/real/binary", &[], Duration::from_secs(1))
            .await;

        match result {
            Err(Error::LaunchFailed { program, .. }) => {
                assert_eq!(program, "/definitely/not/a/real/binary");
            }
            other => panic!("Expected LaunchFailed, got {:?}", other),
        }
    }
}
