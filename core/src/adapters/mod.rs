//! Adapters layer - External system implementations.
//!
//! This module contains implementations of the port traits defined in `ports`.
//! Each adapter handles communication with external systems.

pub mod command;
pub mod process;
pub mod scanner;

// Re-export main types for convenience
pub use command::{CommandResult, CommandRunner};
pub use process::SystemProcesses;
pub use scanner::{OsFamily, PlatformScanner};
