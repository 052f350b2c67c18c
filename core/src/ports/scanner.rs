//! Port scanner port (interface).

use crate::cancellation::ScanCancellation;
use crate::domain::PortRecord;
use crate::error::Result;

/// Port for scanning network ports.
///
/// Implementations invoke a platform tool and parse its text output.
/// Process names may be left as "Unknown" for the caller to resolve.
pub trait PortScannerPort: Send + Sync {
    /// Scan for all listening TCP and UDP sockets.
    ///
    /// Cancellation is only observed between external invocations, never
    /// in the middle of one.
    fn scan(
        &self,
        cancel: &ScanCancellation,
    ) -> impl std::future::Future<Output = Result<Vec<PortRecord>>> + Send;
}
