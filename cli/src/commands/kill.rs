//! Kill command - terminate a process, or every process on a port.

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use portsmanager_core::{
    ConfigStore, PortRecord, PortScanService, ProcessTerminator, ScanCancellation, ScanQuery,
    Settings, SystemProcesses, TerminationKind, TerminationOutcome,
};
use serde::Serialize;
use tracing::info;

/// What to terminate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Pid(u32),
    Port(u16),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KillReport {
    pid: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    process_name: Option<String>,
    escalated: bool,
    outcome: TerminationOutcome,
}

pub async fn run(
    target: Target,
    force: bool,
    timeout: Option<u64>,
    json: bool,
) -> Result<ExitCode> {
    let settings = ConfigStore::new()?.load().await?;
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.termination_timeout());

    let victims = match target {
        Target::Pid(pid) => vec![(pid, None)],
        Target::Port(port) => {
            let query = ScanQuery::new().with_port(port);
            let records = PortScanService::for_current_platform()
                .list(&query, &ScanCancellation::new())
                .await?;
            let owners = owners(&records);
            if owners.is_empty() {
                if json {
                    println!("[]");
                } else {
                    println!("No process found listening on port {}.", port);
                }
                return Ok(ExitCode::FAILURE);
            }
            owners
                .into_iter()
                .map(|(pid, name)| (pid, Some(name)))
                .collect()
        }
    };

    let terminator = ProcessTerminator::<SystemProcesses>::default();
    let mut reports = Vec::with_capacity(victims.len());

    for (pid, process_name) in victims {
        let (outcome, escalated) = terminate(&terminator, pid, force, timeout, &settings).await;
        reports.push(KillReport {
            pid,
            process_name,
            escalated,
            outcome,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match &report.process_name {
                Some(name) => print!("PID {} ({}): ", report.pid, name),
                None => print!("PID {}: ", report.pid),
            }
            println!("{}", report.outcome);
        }
    }

    if reports.iter().all(|r| r.outcome.is_success()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Terminate one process, escalating a refused graceful request when configured.
async fn terminate(
    terminator: &ProcessTerminator,
    pid: u32,
    force: bool,
    timeout: Duration,
    settings: &Settings,
) -> (TerminationOutcome, bool) {
    if force {
        return (terminator.force_terminate(pid, timeout).await, false);
    }

    let outcome = terminator.graceful_terminate(pid, timeout).await;
    if !should_escalate(&outcome, settings) {
        return (outcome, false);
    }

    info!(pid = pid, "Graceful termination timed out, escalating to force");
    (terminator.force_terminate(pid, timeout).await, true)
}

fn should_escalate(outcome: &TerminationOutcome, settings: &Settings) -> bool {
    settings.escalate_to_force && outcome.kind == TerminationKind::StillRunning
}

/// Distinct owning processes, by pid. Unknown owners (pid 0) are skipped.
fn owners(records: &[PortRecord]) -> Vec<(u32, String)> {
    let mut owners = BTreeMap::new();
    for record in records.iter().filter(|r| r.pid != 0) {
        owners
            .entry(record.pid)
            .or_insert_with(|| record.process_name.clone());
    }
    owners.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portsmanager_core::Protocol;

    #[test]
    fn test_owners() {
        let records = vec![
            PortRecord::listening(Protocol::Tcp, 53, 612, "systemd-resolve"),
            PortRecord::listening(Protocol::Udp, 53, 612, "systemd-resolve"),
            PortRecord::listening(Protocol::Udp, 53, 0, "Unknown"),
            PortRecord::listening(Protocol::Tcp, 53, 44, "dnsmasq"),
        ];

        assert_eq!(
            owners(&records),
            vec![
                (44, "dnsmasq".to_string()),
                (612, "systemd-resolve".to_string()),
            ]
        );
    }

    #[test]
    fn test_should_escalate() {
        let escalate = Settings {
            escalate_to_force: true,
            ..Settings::default()
        };
        let still_running = TerminationOutcome::still_running("Process is still running.");

        assert!(should_escalate(&still_running, &escalate));
        assert!(!should_escalate(&still_running, &Settings::default()));
        assert!(!should_escalate(
            &TerminationOutcome::access_denied("Access denied."),
            &escalate
        ));
    }
}
