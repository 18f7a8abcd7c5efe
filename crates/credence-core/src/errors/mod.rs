//! Error handling for Credence.
//! One error enum per subsystem, `thiserror` only.

pub mod compile_error;
pub mod config_error;
pub mod credence_error;
pub mod distribution_error;
pub mod driver_error;
pub mod error_code;
pub mod graph_error;
pub mod network_error;
pub mod provenance_error;
pub mod solver_error;

pub use compile_error::CompileError;
pub use config_error::ConfigError;
pub use credence_error::{CredenceError, CredenceResult};
pub use distribution_error::DistributionError;
pub use driver_error::DriverError;
pub use error_code::CredenceErrorCode;
pub use graph_error::GraphError;
pub use network_error::NetworkError;
pub use provenance_error::ProvenanceError;
pub use solver_error::SolverError;
