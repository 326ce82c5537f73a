//! Error types for the correlation layer

use thiserror::Error;

/// Errors a pending RVI call can complete with
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No reply arrived within the configured window
    #[error("No RVI reply received within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The caller handle was dropped without being completed.
    /// Only happens while the process is shutting down.
    #[error("Pending call abandoned before completion")]
    Abandoned,
}
