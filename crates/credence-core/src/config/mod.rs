//! Configuration system for Credence.
//! TOML-based, layered resolution: CLI > env > project > user > defaults.

pub mod compiler_config;
pub mod credence_config;
pub mod driver_config;
pub mod provenance_config;
pub mod solver_config;

pub use compiler_config::CompilerConfig;
pub use credence_config::{CliOverrides, CredenceConfig};
pub use driver_config::DriverConfig;
pub use provenance_config::ProvenanceConfig;
pub use solver_config::SolverConfig;
