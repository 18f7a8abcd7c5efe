//! CredenceErrorCode trait for the service boundary.

/// Every error enum implements this to expose a stable code string
/// that the orchestration service maps onto its own failure channel.
pub trait CredenceErrorCode {
    /// Returns the error code string (e.g., "GRAPH_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted boundary string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const PROVENANCE_ERROR: &str = "PROVENANCE_ERROR";
pub const GRAPH_ERROR: &str = "GRAPH_ERROR";
pub const DISTRIBUTION_ERROR: &str = "DISTRIBUTION_ERROR";
pub const COMPILE_ERROR: &str = "COMPILE_ERROR";
pub const SOLVER_ERROR: &str = "SOLVER_ERROR";
pub const INCONSISTENT_EVIDENCE: &str = "INCONSISTENT_EVIDENCE";
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
pub const DRIVER_ERROR: &str = "DRIVER_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const CANCELLED: &str = "CANCELLED";
