//! Domain layer - Pure data models.
//!
//! This module contains domain entities that represent core business concepts.
//! These types have no I/O dependencies and can be tested in isolation.

mod port;
mod termination;

// Re-export all domain types
pub use port::{filter_records, PortRecord, Protocol, ScanQuery, LISTENING, UNKNOWN_PROCESS};
pub use termination::{TerminationKind, TerminationOutcome};
