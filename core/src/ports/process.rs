//! Process table port (interface).

/// Read-only view of the live process table.
pub trait ProcessTablePort: Send + Sync {
    /// Check if a process is currently running.
    ///
    /// Zombie entries count as exited.
    fn is_alive(&self, pid: u32) -> bool;

    /// Look up the name of a running process.
    ///
    /// Returns `None` when the process has exited or cannot be inspected.
    fn process_name(&self, pid: u32) -> Option<String>;
}
