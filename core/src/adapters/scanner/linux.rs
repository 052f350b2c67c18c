//! Linux port scanner implementation using ss.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{trace, warn};

use crate::adapters::command::CommandRunner;
use crate::cancellation::ScanCancellation;
use crate::domain::{PortRecord, Protocol, UNKNOWN_PROCESS};
use crate::error::Result;
use crate::ports::PortScannerPort;

use super::endpoint::parse_port;
use super::starts_with_ignore_case;

const SS_TIMEOUT: Duration = Duration::from_secs(3);

fn pid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"pid=(\d+)").expect("pid pattern is valid"))
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]+)""#).expect("name pattern is valid"))
}

/// Linux-specific port scanner.
#[derive(Debug, Clone, Default)]
pub struct LinuxScanner {
    runner: CommandRunner,
}

impl LinuxScanner {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Parse the output of `ss -lntup`.
    ///
    /// Expected ss output format:
    /// ```text
    /// Netid State  Recv-Q Send-Q  Local Address:Port  Peer Address:Port Process
    /// udp   UNCONN 0      0       127.0.0.53%lo:53         0.0.0.0:*    users:(("systemd-resolve",pid=612,fd=13))
    /// tcp   LISTEN 0      511           0.0.0.0:80         0.0.0.0:*    users:(("nginx",pid=4821,fd=6))
    /// tcp   LISTEN 0      4096             [::]:22            [::]:*    users:(("sshd",pid=901,fd=4))
    /// ```
    ///
    /// The process column is only filled for sockets the caller may inspect;
    /// rows without it yield pid 0 and "Unknown".
    ///
    /// One record per (protocol, port, pid). Sockets on several addresses
    /// owned by one process collapse into a single row.
    pub fn parse_ss_output(output: &str) -> Vec<PortRecord> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() || starts_with_ignore_case(line, "Netid") {
                continue;
            }

            // Netid, State, Recv-Q, Send-Q, Local, Peer[, Process]
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 5 {
                trace!(line = line, "Skipping short ss row");
                continue;
            }

            let protocol = if starts_with_ignore_case(tokens[0], "tcp") {
                Protocol::Tcp
            } else if starts_with_ignore_case(tokens[0], "udp") {
                Protocol::Udp
            } else {
                continue;
            };

            let Some(port) = parse_port(tokens[4]) else {
                trace!(line = line, "Skipping ss row without a local port");
                continue;
            };

            // Process info is not positional: a socket shared by several
            // processes lists all of them; the first one wins.
            let pid = pid_pattern()
                .captures(line)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(0);

            let process_name = name_pattern()
                .captures(line)
                .map(|caps| caps[1].to_string())
                .unwrap_or_else(|| UNKNOWN_PROCESS.to_string());

            let record = PortRecord::listening(protocol, port, pid, process_name);
            if seen.insert(record.identity()) {
                records.push(record);
            }
        }

        records
    }
}

impl PortScannerPort for LinuxScanner {
    /// Scan listening sockets.
    ///
    /// Executes: `ss -lntup`
    ///
    /// Flags explained:
    /// -l, --listening     display listening sockets
    /// -n, --numeric       don't resolve service names
    /// -t, --tcp           display TCP sockets
    /// -u, --udp           display UDP sockets
    /// -p, --processes     show process using socket
    async fn scan(&self, _cancel: &ScanCancellation) -> Result<Vec<PortRecord>> {
        let output = self.runner.run("ss", &["-lntup"], SS_TIMEOUT).await?;
        if output.timed_out {
            warn!("ss timed out, parsing partial output");
        }

        Ok(Self::parse_ss_output(&output.stdout))
    }
}
