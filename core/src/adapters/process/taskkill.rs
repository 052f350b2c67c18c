//! Termination through `taskkill`.
//!
//! The output classification is plain text handling and is compiled on every
//! platform; only Windows actually runs the tool.

#![cfg_attr(not(windows), allow(dead_code))]

use std::time::Duration;

use tracing::{debug, warn};

use crate::adapters::command::{CommandResult, CommandRunner, TASKKILL};
use crate::error::{Error, Result};

const TASKKILL_TIMEOUT: Duration = Duration::from_secs(3);

/// Arguments for terminating `pid` and its child processes.
pub(super) fn args(pid: &str, force: bool) -> Vec<&str> {
    let mut args = vec!["/PID", pid, "/T"];
    if force {
        args.push("/F");
    }
    args
}

/// Run taskkill against `pid`, optionally with `/F`.
pub(super) async fn run(runner: &CommandRunner, pid: u32, force: bool) -> Result<()> {
    let pid_arg = pid.to_string();
    debug!(pid = pid, force = force, "Executing taskkill");

    let output = runner
        .run(TASKKILL, &args(&pid_arg, force), TASKKILL_TIMEOUT)
        .await?;
    classify(pid, force, &output)
}

/// Map a taskkill result onto the killer error contract.
pub(super) fn classify(pid: u32, force: bool, output: &CommandResult) -> Result<()> {
    if output.timed_out {
        return Err(Error::KillFailed {
            pid,
            reason: "taskkill timed out".to_string(),
        });
    }
    if output.exit_code == 0 {
        return Ok(());
    }

    let combined = format!("{} {}", output.stdout.trim(), output.stderr.trim());
    let text = combined.to_lowercase();

    if text.contains("access is denied") || text.contains("access denied") {
        warn!(pid = pid, "Access denied to terminate process");
        return Err(Error::PermissionDenied(combined.trim().to_string()));
    }

    if text.contains("not found") || text.contains("could not be found") {
        debug!(pid = pid, "Process not found");
        return Err(Error::ProcessNotFound(pid));
    }

    // Console processes without a window refuse the polite request; the
    // caller's poll then reports them as still running.
    if !force && text.contains("can only be terminated forcefully") {
        debug!(pid = pid, "Process only accepts forceful termination");
        return Ok(());
    }

    Err(Error::KillFailed {
        pid,
        reason: combined.trim().to_string(),
    })
}
