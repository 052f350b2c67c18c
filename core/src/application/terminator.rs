//! Process termination application service.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::adapters::process::SystemProcesses;
use crate::domain::TerminationOutcome;
use crate::error::Error;
use crate::ports::{ProcessKillerPort, ProcessTablePort};

/// Interval between liveness checks while waiting for an exit.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

const MSG_INVALID_PID: &str = "Invalid process id.";
const MSG_NOT_FOUND: &str = "Process not found.";
const MSG_ACCESS_DENIED: &str = "Access denied.";
const MSG_GRACEFUL: &str = "Process terminated gracefully.";
const MSG_STILL_RUNNING: &str = "Process is still running.";
const MSG_FORCEFUL: &str = "Process terminated forcefully.";
const MSG_FORCE_SURVIVED: &str = "Process is still running after forceful termination.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Graceful,
    Force,
}

/// Terminates processes and waits for them to exit.
///
/// Never escalates on its own: a graceful request that the process ignores
/// yields `StillRunning`, and the caller decides whether to force.
#[derive(Debug, Clone, Default)]
pub struct ProcessTerminator<P: ProcessTablePort + ProcessKillerPort = SystemProcesses> {
    processes: P,
}

impl<P: ProcessTablePort + ProcessKillerPort> ProcessTerminator<P> {
    pub fn new(processes: P) -> Self {
        Self { processes }
    }

    /// Ask `pid` to exit and wait up to `timeout` for it to do so.
    pub async fn graceful_terminate(&self, pid: u32, timeout: Duration) -> TerminationOutcome {
        self.terminate(pid, timeout, Mode::Graceful).await
    }

    /// Kill `pid` unconditionally and wait up to `timeout` for it to disappear.
    pub async fn force_terminate(&self, pid: u32, timeout: Duration) -> TerminationOutcome {
        self.terminate(pid, timeout, Mode::Force).await
    }

    async fn terminate(&self, pid: u32, timeout: Duration, mode: Mode) -> TerminationOutcome {
        if pid == 0 || i32::try_from(pid).is_err() {
            return TerminationOutcome::failed(MSG_INVALID_PID);
        }

        if !self.processes.is_alive(pid) {
            debug!(pid = pid, "Process not found");
            return TerminationOutcome::not_found(MSG_NOT_FOUND);
        }

        debug!(pid = pid, mode = ?mode, "Terminating process");
        let request = match mode {
            Mode::Graceful => self.processes.request_exit(pid).await,
            Mode::Force => self.processes.kill(pid).await,
        };

        match request {
            Ok(()) => {}
            // Exited between the liveness check and the request
            Err(Error::ProcessNotFound(_)) => {
                debug!(pid = pid, "Process vanished before the request");
            }
            Err(Error::PermissionDenied(reason)) => {
                warn!(pid = pid, reason = %reason, "Termination refused");
                return TerminationOutcome::access_denied(MSG_ACCESS_DENIED);
            }
            Err(e) => {
                warn!(pid = pid, error = %e, "Termination request failed");
                return TerminationOutcome::failed(e.to_string());
            }
        }

        if self.wait_for_exit(pid, timeout).await {
            match mode {
                Mode::Graceful => TerminationOutcome::success(MSG_GRACEFUL),
                Mode::Force => TerminationOutcome::success(MSG_FORCEFUL),
            }
        } else {
            match mode {
                Mode::Graceful => TerminationOutcome::still_running(MSG_STILL_RUNNING),
                Mode::Force => TerminationOutcome::failed(MSG_FORCE_SURVIVED),
            }
        }
    }

    /// Poll until the process is gone or `timeout` elapses, then check once more.
    ///
    /// A timeout too large to represent as an instant never expires.
    async fn wait_for_exit(&self, pid: u32, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            if !self.processes.is_alive(pid) {
                debug!(pid = pid, "Process exited");
                return true;
            }
            let pause = match deadline {
                Some(deadline) => {
                    POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now()))
                }
                None => POLL_INTERVAL,
            };
            sleep(pause).await;
        }

        let exited = !self.processes.is_alive(pid);
        debug!(pid = pid, exited = exited, "Final liveness check");
        exited
    }
}
