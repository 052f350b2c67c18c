//! Unix signal delivery through `kill(2)`.

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Send SIGTERM.
pub(super) fn terminate(pid: u32) -> Result<()> {
    send_signal(pid, Signal::SIGTERM)
}

/// Send SIGKILL.
pub(super) fn kill(pid: u32) -> Result<()> {
    send_signal(pid, Signal::SIGKILL)
}

fn send_signal(pid: u32, signal: Signal) -> Result<()> {
    // 0 and negative values address process groups
    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => {
            return Err(Error::KillFailed {
                pid,
                reason: "invalid process id".to_string(),
            })
        }
    };

    debug!(pid = pid, signal = %signal, "Sending signal to process");

    match signal::kill(Pid::from_raw(raw), signal) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => {
            debug!(pid = pid, "Process not found");
            Err(Error::ProcessNotFound(pid))
        }
        Err(Errno::EPERM) => {
            warn!(pid = pid, signal = %signal, "Permission denied to signal process");
            Err(Error::PermissionDenied(format!(
                "not allowed to send {} to process {}",
                signal, pid
            )))
        }
        Err(errno) => Err(Error::KillFailed {
            pid,
            reason: errno.desc().to_string(),
        }),
    }
}
