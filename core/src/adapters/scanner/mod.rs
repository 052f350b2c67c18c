//! Port scanner adapters.
//!
//! One scanner per OS family, each wrapping the platform's socket listing
//! tool. All parsers are compiled on every platform so captured output from
//! any OS can be parsed and tested anywhere.

mod endpoint;
mod linux;
mod macos;
mod windows;

pub use endpoint::parse_port;
pub use linux::LinuxScanner;
pub use macos::MacOsScanner;
pub use windows::WindowsScanner;

use serde::{Deserialize, Serialize};

use crate::adapters::command::CommandRunner;
use crate::cancellation::ScanCancellation;
use crate::domain::PortRecord;
use crate::error::Result;
use crate::ports::PortScannerPort;

/// Operating system family a scanner targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OsFamily {
    Windows,
    MacOs,
    Linux,
}

impl OsFamily {
    /// Map an OS name (as in `std::env::consts::OS`) to a family.
    ///
    /// Anything that is neither Windows nor macOS is treated as Linux.
    pub fn from_os_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("windows") {
            OsFamily::Windows
        } else if name.eq_ignore_ascii_case("macos") {
            OsFamily::MacOs
        } else {
            OsFamily::Linux
        }
    }

    /// The family of the host this binary runs on.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::MacOs => "macOS",
            OsFamily::Linux => "Linux",
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The port scanner for a given OS family.
#[derive(Debug, Clone)]
pub enum PlatformScanner {
    Windows(WindowsScanner),
    MacOs(MacOsScanner),
    Linux(LinuxScanner),
}

impl PlatformScanner {
    /// Create the scanner for the current platform.
    pub fn new() -> Self {
        Self::for_os(OsFamily::current(), CommandRunner::new())
    }

    /// Create the scanner for `os`, running tools through `runner`.
    pub fn for_os(os: OsFamily, runner: CommandRunner) -> Self {
        match os {
            OsFamily::Windows => PlatformScanner::Windows(WindowsScanner::new(runner)),
            OsFamily::MacOs => PlatformScanner::MacOs(MacOsScanner::new(runner)),
            OsFamily::Linux => PlatformScanner::Linux(LinuxScanner::new(runner)),
        }
    }

    /// The OS family this scanner targets.
    pub fn os(&self) -> OsFamily {
        match self {
            PlatformScanner::Windows(_) => OsFamily::Windows,
            PlatformScanner::MacOs(_) => OsFamily::MacOs,
            PlatformScanner::Linux(_) => OsFamily::Linux,
        }
    }
}

impl Default for PlatformScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PortScannerPort for PlatformScanner {
    async fn scan(&self, cancel: &ScanCancellation) -> Result<Vec<PortRecord>> {
        match self {
            PlatformScanner::Windows(inner) => inner.scan(cancel).await,
            PlatformScanner::MacOs(inner) => inner.scan(cancel).await,
            PlatformScanner::Linux(inner) => inner.scan(cancel).await,
        }
    }
}

/// ASCII case-insensitive prefix check.
pub(super) fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_family_from_name() {
        assert_eq!(OsFamily::from_os_name("windows"), OsFamily::Windows);
        assert_eq!(OsFamily::from_os_name("Windows"), OsFamily::Windows);
        assert_eq!(OsFamily::from_os_name("macos"), OsFamily::MacOs);
        assert_eq!(OsFamily::from_os_name("MACOS"), OsFamily::MacOs);
        assert_eq!(OsFamily::from_os_name("linux"), OsFamily::Linux);
        assert_eq!(OsFamily::from_os_name("freebsd"), OsFamily::Linux);
        assert_eq!(OsFamily::from_os_name(""), OsFamily::Linux);
    }

    #[test]
    fn test_selector_matches_family() {
        for os in [OsFamily::Windows, OsFamily::MacOs, OsFamily::Linux] {
            let scanner = PlatformScanner::for_os(os, CommandRunner::new());
            assert_eq!(scanner.os(), os);
        }
    }

    #[test]
    fn test_current_platform() {
        let scanner = PlatformScanner::new();
        assert_eq!(scanner.os(), OsFamily::current());

        #[cfg(target_os = "linux")]
        assert_eq!(OsFamily::current(), OsFamily::Linux);
        #[cfg(target_os = "macos")]
        assert_eq!(OsFamily::current(), OsFamily::MacOs);
        #[cfg(target_os = "windows")]
        assert_eq!(OsFamily::current(), OsFamily::Windows);
    }

    #[test]
    fn test_starts_with_ignore_case() {
        assert!(starts_with_ignore_case("TCP6", "tcp"));
        assert!(starts_with_ignore_case("netid State", "Netid"));
        assert!(!starts_with_ignore_case("tc", "tcp"));
        assert!(!starts_with_ignore_case("udp", "tcp"));
        // Non-ASCII text must not panic on a char boundary
        assert!(!starts_with_ignore_case("é", "e"));
    }
}
