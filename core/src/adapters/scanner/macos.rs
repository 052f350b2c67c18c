//! macOS port scanner implementation using lsof.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, trace, warn};

use crate::adapters::command::CommandRunner;
use crate::cancellation::ScanCancellation;
use crate::domain::{PortRecord, Protocol};
use crate::error::{Error, Result};
use crate::ports::PortScannerPort;

use super::starts_with_ignore_case;

const LSOF: &str = "lsof";
const LSOF_TIMEOUT: Duration = Duration::from_secs(3);

const TCP_ARGS: &[&str] = &["-nP", "-iTCP", "-sTCP:LISTEN"];
const UDP_ARGS: &[&str] = &["-nP", "-iUDP"];

fn port_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":(\d+)").expect("port pattern is valid"))
}

/// macOS-specific port scanner using lsof.
#[derive(Debug, Clone, Default)]
pub struct MacOsScanner {
    runner: CommandRunner,
}

impl MacOsScanner {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    /// Parse lsof output, tagging every row with `protocol`.
    ///
    /// ```text
    /// COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
    /// node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
    /// Code\x20H  812  code   31u  IPv4 0x1234567890abcdef      0t0  TCP 127.0.0.1:9229 (LISTEN)
    /// ```
    ///
    /// The port is taken from the last `:<digits>` in the row. lsof escapes
    /// spaces and slashes in command names as `\x20` and `\x2f`.
    ///
    /// Rows sharing protocol, port and pid are reported once, so the result
    /// lists owners rather than individual file descriptors.
    pub fn parse_lsof_output(output: &str, protocol: Protocol) -> Vec<PortRecord> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() || starts_with_ignore_case(line, "COMMAND") {
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                continue;
            }

            let pid: u32 = match tokens[1].parse() {
                Ok(p) => p,
                Err(_) => {
                    trace!(line = line, "Skipping lsof row without a pid");
                    continue;
                }
            };

            let port = port_pattern()
                .captures_iter(line)
                .last()
                .and_then(|caps| caps[1].parse::<u16>().ok());
            let Some(port) = port else {
                trace!(line = line, "Skipping lsof row without a port");
                continue;
            };

            let process_name = tokens[0].replace("\\x20", " ").replace("\\x2f", "/");

            let record = PortRecord::listening(protocol, port, pid, process_name);
            if seen.insert(record.identity()) {
                records.push(record);
            }
        }

        records
    }

    async fn lsof(&self, args: &[&str], protocol: Protocol) -> Result<Vec<PortRecord>> {
        let output = self.runner.run(LSOF, args, LSOF_TIMEOUT).await?;
        if output.timed_out {
            warn!(protocol = %protocol, "lsof timed out, parsing partial output");
        }

        let records = Self::parse_lsof_output(&output.stdout, protocol);
        debug!(protocol = %protocol, count = records.len(), "Parsed lsof output");
        Ok(records)
    }
}

impl PortScannerPort for MacOsScanner {
    /// Scan listening TCP sockets, then UDP sockets.
    ///
    /// lsof exits 1 when nothing matches, so exit codes are ignored.
    async fn scan(&self, cancel: &ScanCancellation) -> Result<Vec<PortRecord>> {
        let mut records = self.lsof(TCP_ARGS, Protocol::Tcp).await?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        records.extend(self.lsof(UDP_ARGS, Protocol::Udp).await?);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsof_output() {
        let output = r#"COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
nginx     4821  root    6u  IPv4 0x1234567890abcdef      0t0  TCP *:8080 (LISTEN)
"#;

        let records = MacOsScanner::parse_lsof_output(output, Protocol::Tcp);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].port, 3000);
        assert_eq!(records[0].pid, 34805);
        assert_eq!(records[0].process_name, "node");

        assert_eq!(records[1].protocol, Protocol::Tcp);
        assert_eq!(records[1].pid, 4821);
        assert_eq!(records[1].port, 8080);
        assert_eq!(records[1].process_name, "nginx");
        assert_eq!(records[1].status, "Listening");
    }

    #[test]
    fn test_escaped_names_decoded() {
        let output = r"Code\x20Helper  812 code 31u IPv4 0xabc 0t0 TCP 127.0.0.1:9229 (LISTEN)
com.apple\x2fx   90 root 12u IPv4 0xdef 0t0 TCP *:7000 (LISTEN)";

        let records = MacOsScanner::parse_lsof_output(output, Protocol::Tcp);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].process_name, "Code Helper");
        assert_eq!(records[1].process_name, "com.apple/x");
    }

    #[test]
    fn test_udp_rows_tagged() {
        let output = "\
COMMAND     PID  USER   FD   TYPE DEVICE SIZE/OFF NODE NAME
mDNSRespo   512  _mdns  8u  IPv4 0x111      0t0  UDP *:5353
mDNSRespo   512  _mdns  9u  IPv6 0x222      0t0  UDP *:5353
";
        let records = MacOsScanner::parse_lsof_output(output, Protocol::Udp);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].protocol, Protocol::Udp);
        assert_eq!(records[0].port, 5353);
        assert_eq!(records[0].pid, 512);
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let output = "\
lonely
node notapid code 19u IPv6 0x1 0t0 TCP [::1]:3000 (LISTEN)
node 100 code 19u IPv6 0x1 0t0 TCP nowhere (LISTEN)
node 101 code 19u IPv6 0x1 0t0 TCP *:99999 (LISTEN)
";
        assert!(MacOsScanner::parse_lsof_output(output, Protocol::Tcp).is_empty());
    }
}
