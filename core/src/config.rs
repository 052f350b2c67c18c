//! Configuration loading.
//!
//! Settings live in JSON at `~/.portsmanager/config.json`. The file is only
//! read, never written; a missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::error::{Error, Result};

/// User settings. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// How long to wait for a process to exit after a termination request.
    #[serde(default = "default_termination_timeout")]
    pub termination_timeout_secs: u64,

    /// Follow a graceful request the process ignored with a forceful one.
    #[serde(default)]
    pub escalate_to_force: bool,
}

fn default_termination_timeout() -> u64 {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            termination_timeout_secs: default_termination_timeout(),
            escalate_to_force: false,
        }
    }
}

impl Settings {
    pub fn termination_timeout(&self) -> Duration {
        Duration::from_secs(self.termination_timeout_secs)
    }
}

/// Read-only access to the settings file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a config store with the default path.
    ///
    /// Default path: `~/.portsmanager/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".portsmanager").join("config.json"),
        })
    }

    /// Create a config store with a custom path (for testing).
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load settings from disk.
    ///
    /// Returns defaults if the file doesn't exist.
    pub async fn load(&self) -> Result<Settings> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.config_path.display(), "No config file, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(Error::Config(format!("Failed to read config: {}", e))),
        };

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }
}
