//! Config command - show the effective configuration.

use std::process::ExitCode;

use anyhow::Result;
use portsmanager_core::ConfigStore;

pub async fn show(json: bool) -> Result<ExitCode> {
    let store = ConfigStore::new()?;
    let settings = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Config file: {}", store.path().display());
    println!("Termination timeout: {}s", settings.termination_timeout_secs);
    println!(
        "Escalate to force: {}",
        if settings.escalate_to_force { "yes" } else { "no" }
    );
    Ok(ExitCode::SUCCESS)
}
