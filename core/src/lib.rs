//! PortsManager Core Library
//!
//! Cross-platform library for finding which processes own listening ports
//! and terminating them. Provides functionality to:
//! - Scan listening TCP and UDP sockets with their owning process
//! - Filter and sort the results
//! - Terminate processes gracefully or forcefully and report the outcome
//! - Read user configuration
//!
//! # Architecture
//! This library follows hexagonal architecture (ports & adapters):
//! - `domain`: Pure data models
//! - `ports`: Trait definitions (interfaces)
//! - `adapters`: External system implementations
//! - `application`: Use case services
//!
//! # Platform Support
//! - Windows: `netstat -ano`, window messages and `taskkill`
//! - Linux: `ss -lntup` and signals
//! - macOS: `lsof` and signals

// Hexagonal architecture layers
pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub mod cancellation;
pub mod config;
pub mod error;

// Re-export domain types (primary API)
pub use domain::{
    filter_records, PortRecord, Protocol, ScanQuery, TerminationKind, TerminationOutcome,
};

// Re-export other commonly used types
pub use adapters::{CommandResult, CommandRunner, OsFamily, PlatformScanner, SystemProcesses};
pub use application::{PortScanService, ProcessTerminator};
pub use cancellation::ScanCancellation;
pub use config::{ConfigStore, Settings};
pub use error::{Error, Result};
