//! List command - show all listening ports.

use std::process::ExitCode;

use anyhow::Result;
use portsmanager_core::{PortScanService, ScanCancellation, ScanQuery};

use super::truncate;

pub async fn run(
    port_filter: Option<u16>,
    name_filter: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let mut query = ScanQuery::new();
    if let Some(port) = port_filter {
        query = query.with_port(port);
    }
    if let Some(name) = name_filter {
        query = query.with_process_name(name);
    }

    let service = PortScanService::for_current_platform();
    let records = service.list(&query, &ScanCancellation::new()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(ExitCode::SUCCESS);
    }

    if records.is_empty() {
        println!("No listening ports found.");
        return Ok(ExitCode::SUCCESS);
    }

    // Table header
    println!(
        "{:<6} {:<6} {:<8} {:<24} STATUS",
        "PROTO", "PORT", "PID", "PROCESS"
    );
    println!("{}", "-".repeat(60));

    for record in &records {
        println!(
            "{:<6} {:<6} {:<8} {:<24} {}",
            record.protocol,
            record.port,
            record.pid,
            truncate(&record.process_name, 24),
            record.status
        );
    }

    println!("\nTotal: {} ports", records.len());
    Ok(ExitCode::SUCCESS)
}
