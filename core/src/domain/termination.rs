//! Termination outcome domain model.

use serde::{Deserialize, Serialize};

/// Closed set of results a termination attempt can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationKind {
    /// The process exited within the timeout.
    Success,
    /// No live process with the given PID.
    NotFound,
    /// The OS refused the termination request.
    AccessDenied,
    /// A graceful request was delivered but the process outlived the timeout.
    StillRunning,
    /// Anything else, including a forceful kill the process survived.
    Failed,
}

impl TerminationKind {
    /// Get the display name for this kind.
    pub fn display_name(&self) -> &'static str {
        match self {
            TerminationKind::Success => "Success",
            TerminationKind::NotFound => "Not found",
            TerminationKind::AccessDenied => "Access denied",
            TerminationKind::StillRunning => "Still running",
            TerminationKind::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for TerminationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of one termination attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminationOutcome {
    pub kind: TerminationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TerminationOutcome {
    fn new(kind: TerminationKind, message: Option<String>) -> Self {
        Self { kind, message }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(TerminationKind::Success, Some(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(TerminationKind::NotFound, Some(message.into()))
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(TerminationKind::AccessDenied, Some(message.into()))
    }

    pub fn still_running(message: impl Into<String>) -> Self {
        Self::new(TerminationKind::StillRunning, Some(message.into()))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(TerminationKind::Failed, Some(message.into()))
    }

    pub fn is_success(&self) -> bool {
        self.kind == TerminationKind::Success
    }
}

impl std::fmt::Display for TerminationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}", self.kind),
        }
    }
}
