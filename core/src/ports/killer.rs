//! Process killer port (interface).

use crate::error::Result;

/// Port for delivering termination requests.
///
/// Implementations only send the request; waiting for the process to exit
/// is left to the caller.
///
/// Errors are reported as [`Error::PermissionDenied`](crate::Error::PermissionDenied)
/// when the OS refuses, [`Error::ProcessNotFound`](crate::Error::ProcessNotFound)
/// when the process is already gone, and any other variant for everything else.
pub trait ProcessKillerPort: Send + Sync {
    /// Ask a process to exit (SIGTERM, window close or plain taskkill).
    fn request_exit(&self, pid: u32) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Terminate a process unconditionally (SIGKILL or taskkill /F).
    fn kill(&self, pid: u32) -> impl std::future::Future<Output = Result<()>> + Send;
}
