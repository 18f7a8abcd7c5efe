//! # credence-core
//!
//! Foundation crate for the Credence confidence engine.
//! Defines the fact model, the upstream fact boundary, errors, config,
//! tracing setup, and shared constants used by every other crate.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod traits;
pub mod types;

pub use config::CredenceConfig;
pub use errors::{CredenceError, CredenceErrorCode, CredenceResult};
pub use traits::{Cancellable, CancellationToken, FactSource, StaticFacts};
pub use types::{ConstraintItem, Tuple};
