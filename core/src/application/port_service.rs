//! Port listing application service.

use tracing::debug;

use crate::adapters::process::SystemProcesses;
use crate::adapters::scanner::PlatformScanner;
use crate::cancellation::ScanCancellation;
use crate::domain::{PortRecord, ScanQuery, LISTENING, UNKNOWN_PROCESS};
use crate::error::{Error, Result};
use crate::ports::{PortScannerPort, ProcessTablePort};

/// Application service for listing listening ports.
///
/// Scans through a `PortScannerPort`, resolves missing process names through
/// a `ProcessTablePort`, then filters and sorts. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct PortScanService<S: PortScannerPort, T: ProcessTablePort = SystemProcesses> {
    scanner: S,
    processes: T,
}

impl PortScanService<PlatformScanner> {
    /// Create a service for the current platform.
    pub fn for_current_platform() -> Self {
        Self::new(PlatformScanner::new())
    }
}

impl<S: PortScannerPort> PortScanService<S> {
    /// Create a service that resolves names from the OS process table.
    pub fn new(scanner: S) -> Self {
        Self::with_process_table(scanner, SystemProcesses::default())
    }
}

impl<S: PortScannerPort, T: ProcessTablePort> PortScanService<S, T> {
    /// Create a service with an explicit process table.
    pub fn with_process_table(scanner: S, processes: T) -> Self {
        Self { scanner, processes }
    }

    /// List listening sockets matching `query`, sorted by port then protocol.
    ///
    /// Cancellation is checked before the scan and once the scan returns.
    ///
    /// # Errors
    ///
    /// [`Error::Cancelled`] when `cancel` is set, and any scanner error.
    pub async fn list(
        &self,
        query: &ScanQuery,
        cancel: &ScanCancellation,
    ) -> Result<Vec<PortRecord>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let scanned = self.scanner.scan(cancel).await?;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let scanned_count = scanned.len();
        let mut records: Vec<PortRecord> = scanned
            .iter()
            .map(|record| self.enrich(record))
            .filter(|record| query.matches(record))
            .collect();

        records.sort_by(|a, b| {
            a.port
                .cmp(&b.port)
                .then_with(|| a.protocol.as_str().cmp(b.protocol.as_str()))
        });

        debug!(scanned = scanned_count, returned = records.len(), "Listed ports");
        Ok(records)
    }

    /// Build the presented record: resolved name and a non-empty status.
    fn enrich(&self, record: &PortRecord) -> PortRecord {
        let process_name = if record.needs_name() && record.pid != 0 {
            self.processes
                .process_name(record.pid)
                .unwrap_or_else(|| UNKNOWN_PROCESS.to_string())
        } else if record.needs_name() {
            UNKNOWN_PROCESS.to_string()
        } else {
            record.process_name.clone()
        };

        let status = if record.status.trim().is_empty() {
            LISTENING.to_string()
        } else {
            record.status.clone()
        };

        PortRecord {
            protocol: record.protocol,
            port: record.port,
            pid: record.pid,
            process_name,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Protocol;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock scanner for testing.
    struct MockScanner {
        records: Vec<PortRecord>,
        scans: AtomicUsize,
        cancel_during_scan: bool,
    }

    impl MockScanner {
        fn new(records: Vec<PortRecord>) -> Self {
            Self {
                records,
                scans: AtomicUsize::new(0),
                cancel_during_scan: false,
            }
        }
    }

    impl PortScannerPort for MockScanner {
        async fn scan(&self, cancel: &ScanCancellation) -> Result<Vec<PortRecord>> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            if self.cancel_during_scan {
                cancel.cancel();
            }
            Ok(self.records.clone())
        }
    }

    /// Mock process table recording every lookup.
    #[derive(Default)]
    struct MockTable {
        names: HashMap<u32, String>,
        lookups: Mutex<Vec<u32>>,
    }

    impl MockTable {
        fn with_name(mut self, pid: u32, name: &str) -> Self {
            self.names.insert(pid, name.to_string());
            self
        }

        fn lookups(&self) -> Vec<u32> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl ProcessTablePort for MockTable {
        fn is_alive(&self, pid: u32) -> bool {
            self.names.contains_key(&pid)
        }

        fn process_name(&self, pid: u32) -> Option<String> {
            self.lookups.lock().unwrap().push(pid);
            self.names.get(&pid).cloned()
        }
    }

    fn service(
        records: Vec<PortRecord>,
        table: MockTable,
    ) -> PortScanService<MockScanner, MockTable> {
        PortScanService::with_process_table(MockScanner::new(records), table)
    }

    #[tokio::test]
    async fn test_cancelled_before_scan() {
        let service = service(vec![], MockTable::default());
        let cancel = ScanCancellation::new();
        cancel.cancel();

        let result = service.list(&ScanQuery::new(), &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(service.scanner.scans.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_during_scan() {
        let mut scanner = MockScanner::new(vec![PortRecord::listening(Protocol::Tcp, 80, 1, "a")]);
        scanner.cancel_during_scan = true;
        let service = PortScanService::with_process_table(scanner, MockTable::default());

        let result = service.list(&ScanQuery::new(), &ScanCancellation::new()).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_sorted_by_port_then_protocol() {
        let records = vec![
            PortRecord::listening(Protocol::Udp, 53, 10, "dnsmasq"),
            PortRecord::listening(Protocol::Tcp, 8080, 11, "nginx"),
            PortRecord::listening(Protocol::Tcp, 53, 10, "dnsmasq"),
            PortRecord::listening(Protocol::Tcp, 22, 12, "sshd"),
        ];
        let service = service(records, MockTable::default());

        let listed = service
            .list(&ScanQuery::new(), &ScanCancellation::new())
            .await
            .unwrap();

        let order: Vec<(u16, Protocol)> = listed.iter().map(|r| (r.port, r.protocol)).collect();
        assert_eq!(
            order,
            vec![
                (22, Protocol::Tcp),
                (53, Protocol::Tcp),
                (53, Protocol::Udp),
                (8080, Protocol::Tcp),
            ]
        );
    }

    #[tokio::test]
    async fn test_enrichment() {
        let records = vec![
            PortRecord::listening(Protocol::Tcp, 135, 1020, "Unknown"),
            PortRecord::listening(Protocol::Tcp, 445, 4, ""),
            PortRecord::listening(Protocol::Tcp, 3000, 0, "Unknown"),
            PortRecord::listening(Protocol::Udp, 5353, 2212, "mdns"),
        ];
        let table = MockTable::default().with_name(1020, "svchost");
        let service = service(records, table);

        let listed = service
            .list(&ScanQuery::new(), &ScanCancellation::new())
            .await
            .unwrap();

        assert_eq!(listed[0].process_name, "svchost");
        // Lookup failed
        assert_eq!(listed[1].process_name, "Unknown");
        // pid 0 never looked up
        assert_eq!(listed[2].process_name, "Unknown");
        assert_eq!(listed[3].process_name, "mdns");

        let mut lookups = service.processes.lookups();
        lookups.sort();
        assert_eq!(lookups, vec![4, 1020]);
    }

    #[tokio::test]
    async fn test_blank_status_normalized() {
        let mut record = PortRecord::listening(Protocol::Tcp, 80, 1, "httpd");
        record.status = "  ".to_string();
        let service = service(vec![record], MockTable::default());

        let listed = service
            .list(&ScanQuery::new(), &ScanCancellation::new())
            .await
            .unwrap();
        assert_eq!(listed[0].status, "Listening");
    }

    #[tokio::test]
    async fn test_filter_applies_to_resolved_names() {
        let records = vec![
            PortRecord::listening(Protocol::Tcp, 3000, 77, "Unknown"),
            PortRecord::listening(Protocol::Tcp, 8080, 78, "nginx"),
            PortRecord::listening(Protocol::Udp, 3000, 79, "dns"),
        ];
        let table = MockTable::default().with_name(77, "node");
        let service = service(records, table);
        let cancel = ScanCancellation::new();

        let by_name = service
            .list(&ScanQuery::new().with_process_name("NODE"), &cancel)
            .await
            .unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].pid, 77);

        let by_port = service
            .list(&ScanQuery::new().with_port(3000), &cancel)
            .await
            .unwrap();
        assert_eq!(by_port.len(), 2);
        assert_eq!(by_port[0].protocol, Protocol::Tcp);

        let nothing = service
            .list(&ScanQuery::new().with_port(3000).with_process_name("nginx"), &cancel)
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_scanner_output_untouched() {
        let records = vec![PortRecord::listening(Protocol::Tcp, 135, 1020, "Unknown")];
        let table = MockTable::default().with_name(1020, "svchost");
        let service = service(records, table);

        service
            .list(&ScanQuery::new(), &ScanCancellation::new())
            .await
            .unwrap();
        assert_eq!(service.scanner.records[0].process_name, "Unknown");
    }
}
