//! Boundary traits shared across crates.

pub mod cancellation;
pub mod fact_source;

pub use cancellation::{Cancellable, CancellationToken};
pub use fact_source::{FactSource, StaticFacts};
