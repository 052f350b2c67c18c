//! Application layer - Use case services.
//!
//! Services are thin orchestrators that:
//! - Accept domain types as inputs
//! - Use ports (traits) for external dependencies
//! - Return domain types as outputs

mod port_service;
mod terminator;

pub use port_service::PortScanService;
pub use terminator::ProcessTerminator;
