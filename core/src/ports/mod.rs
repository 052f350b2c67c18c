//! Ports layer - Trait definitions (interfaces).
//!
//! This module defines the interfaces that the application layer uses
//! to interact with external systems. Implementations live in `adapters`.

mod killer;
mod process;
mod scanner;

pub use killer::ProcessKillerPort;
pub use process::ProcessTablePort;
pub use scanner::PortScannerPort;
