//! Windows port scanner implementation using netstat.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{trace, warn};

use crate::adapters::command::CommandRunner;
use crate::cancellation::ScanCancellation;
use crate::domain::{PortRecord, Protocol, UNKNOWN_PROCESS};
use crate::error::Result;
use crate::ports::PortScannerPort;

use super::endpoint::parse_port;
use super::starts_with_ignore_case;

/// Absolute path so PATH lookup can never pick a different netstat.
const NETSTAT: &str = r"C:\Windows\System32\netstat.exe";

/// netstat can be slow on a loaded machine.
const NETSTAT_TIMEOUT: Duration = Duration::from_secs(30);

/// Windows-specific port scanner.
///
/// netstat does not report process names; records come back as "Unknown"
/// and are resolved by the scan service.
#[derive(Debug, Clone, Default)]
pub struct WindowsScanner {
    runner: CommandRunner,
}

impl WindowsScanner {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Parse the output of `netstat -ano`.
    ///
    /// Example output:
    /// ```text
    /// Active Connections
    ///
    ///   Proto  Local Address          Foreign Address        State           PID
    ///   TCP    0.0.0.0:135            0.0.0.0:0              LISTENING       1020
    ///   TCP    192.168.1.20:49712     52.1.1.1:443           ESTABLISHED     6644
    ///   TCP    [::]:445               [::]:0                 LISTENING       4
    ///   UDP    0.0.0.0:5353           *:*                                    2212
    /// ```
    ///
    /// TCP rows are kept only in the LISTENING state. UDP rows carry no
    /// state column and are always kept.
    ///
    /// Records are per owner, not per socket: an IPv4 and an IPv6 listener
    /// held by the same pid on the same port and protocol yield one record.
    pub fn parse_netstat_output(output: &str) -> Vec<PortRecord> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for line in output.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();

            // Banner and header lines don't start with a protocol
            let protocol = match tokens.first() {
                Some(t) if starts_with_ignore_case(t, "TCP") => Protocol::Tcp,
                Some(t) if starts_with_ignore_case(t, "UDP") => Protocol::Udp,
                _ => continue,
            };

            // TCP: Proto, Local, Foreign, State, PID
            // UDP: Proto, Local, Foreign, PID
            if tokens.len() < 4 {
                trace!(line = line, "Skipping short netstat row");
                continue;
            }

            let Some(port) = parse_port(tokens[1]) else {
                trace!(line = line, "Skipping netstat row without a local port");
                continue;
            };

            let pid: u32 = match tokens[tokens.len() - 1].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            if protocol == Protocol::Tcp
                && (tokens.len() < 5 || !tokens[3].eq_ignore_ascii_case("LISTENING"))
            {
                continue;
            }

            let record = PortRecord::listening(protocol, port, pid, UNKNOWN_PROCESS);
            if seen.insert(record.identity()) {
                records.push(record);
            }
        }

        records
    }
}

impl PortScannerPort for WindowsScanner {
    async fn scan(&self, _cancel: &ScanCancellation) -> Result<Vec<PortRecord>> {
        let output = self.runner.run(NETSTAT, &["-ano"], NETSTAT_TIMEOUT).await?;
        if output.timed_out {
            warn!("netstat timed out, parsing partial output");
        }

        Ok(Self::parse_netstat_output(&output.stdout))
    }
}
