//! Process table and signalling adapters.
//!
//! Liveness and names come from the OS process table through sysinfo.
//! Termination requests use `kill(2)` on Unix and window messages or
//! taskkill on Windows.

mod taskkill;

#[cfg(unix)]
mod unix;

#[cfg(windows)]
mod windows;

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tracing::trace;

use crate::adapters::command::CommandRunner;
use crate::error::Result;
use crate::ports::{ProcessKillerPort, ProcessTablePort};

/// The live OS process table.
#[derive(Debug, Clone, Default)]
pub struct SystemProcesses {
    #[cfg_attr(not(windows), allow(dead_code))]
    runner: CommandRunner,
}

impl SystemProcesses {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Fresh snapshot of a single process.
    fn snapshot(pid: u32) -> System {
        let mut system = System::new();
        let pid = Pid::from_u32(pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        system
    }
}

impl ProcessTablePort for SystemProcesses {
    fn is_alive(&self, pid: u32) -> bool {
        let system = Self::snapshot(pid);
        let alive = match system.process(Pid::from_u32(pid)) {
            Some(process) => {
                !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead)
            }
            None => false,
        };
        trace!(pid = pid, alive = alive, "Process liveness check");
        alive
    }

    fn process_name(&self, pid: u32) -> Option<String> {
        let system = Self::snapshot(pid);
        let process = system.process(Pid::from_u32(pid))?;
        let name = process.name().to_string_lossy();
        let name = strip_exe_suffix(name.trim());
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

impl ProcessKillerPort for SystemProcesses {
    async fn request_exit(&self, pid: u32) -> Result<()> {
        #[cfg(unix)]
        {
            unix::terminate(pid)
        }

        #[cfg(windows)]
        {
            if windows::close_main_window(pid) {
                return Ok(());
            }
            taskkill::run(&self.runner, pid, false).await
        }
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        #[cfg(unix)]
        {
            unix::kill(pid)
        }

        #[cfg(windows)]
        {
            taskkill::run(&self.runner, pid, true).await
        }
    }
}

/// Drop a trailing ".exe" (any case) from a Windows image name.
fn strip_exe_suffix(name: &str) -> &str {
    let cut = name.len().saturating_sub(4);
    match name.get(cut..) {
        Some(suffix) if cut > 0 && suffix.eq_ignore_ascii_case(".exe") => &name[..cut],
        _ => name,
    }
}
