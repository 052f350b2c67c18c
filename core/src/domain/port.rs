//! Port and process domain models.

use serde::{Deserialize, Serialize};

/// Placeholder process name used until the owner has been resolved.
pub const UNKNOWN_PROCESS: &str = "Unknown";

/// Status reported for every surfaced socket.
pub const LISTENING: &str = "Listening";

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

impl Protocol {
    /// Upper-case protocol name as shown to users ("TCP" / "UDP").
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ============================================================================
// PortRecord
// ============================================================================

/// One listening socket bound to a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRecord {
    /// Transport protocol.
    pub protocol: Protocol,
    /// Local port number.
    pub port: u16,
    /// Owning process id; 0 when the owner is unknown.
    pub pid: u32,
    /// Owning process name, or "Unknown" until resolved.
    pub process_name: String,
    /// Socket status.
    pub status: String,
}

impl PortRecord {
    /// Create a listening record.
    pub fn listening(
        protocol: Protocol,
        port: u16,
        pid: u32,
        process_name: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            port,
            pid,
            process_name: process_name.into(),
            status: LISTENING.to_string(),
        }
    }

    /// Whether the process name still needs to be resolved from the process table.
    pub fn needs_name(&self) -> bool {
        let name = self.process_name.trim();
        name.is_empty() || name.eq_ignore_ascii_case(UNKNOWN_PROCESS)
    }

    /// Key used to drop duplicate rows reported by the OS tools.
    pub(crate) fn identity(&self) -> (Protocol, u16, u32) {
        (self.protocol, self.port, self.pid)
    }
}

impl std::fmt::Display for PortRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} :{} (PID: {}, Process: {})",
            self.protocol, self.port, self.pid, self.process_name
        )
    }
}

// ============================================================================
// ScanQuery
// ============================================================================

/// Filter criteria for port listings. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanQuery {
    /// Exact port number.
    #[serde(default)]
    pub port: Option<u16>,
    /// Case-insensitive substring of the process name.
    #[serde(default)]
    pub process_name: Option<String>,
}

impl ScanQuery {
    /// Create a query that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an exact port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Restrict to process names containing `text` (case-insensitive).
    pub fn with_process_name(mut self, text: impl Into<String>) -> Self {
        self.process_name = Some(text.into());
        self
    }

    /// Check if the query has any active conditions.
    pub fn is_active(&self) -> bool {
        self.port.is_some() || self.name_filter().is_some()
    }

    /// Check if a record matches all query criteria.
    pub fn matches(&self, record: &PortRecord) -> bool {
        if let Some(port) = self.port {
            if record.port != port {
                return false;
            }
        }
        if let Some(needle) = self.name_filter() {
            if !record
                .process_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    /// Blank name filters are treated as absent.
    fn name_filter(&self) -> Option<&str> {
        self.process_name
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

/// Apply a query to a list of records.
pub fn filter_records(records: &[PortRecord], query: &ScanQuery) -> Vec<PortRecord> {
    records
        .iter()
        .filter(|r| query.matches(r))
        .cloned()
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
