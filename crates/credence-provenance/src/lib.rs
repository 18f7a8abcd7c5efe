//! # credence-provenance
//!
//! Turns a possibly-cyclic derivation forest into an acyclic, relevance-pruned
//! `Provenance` with stable string ids.
//!
//! - `dob`: birth-date fixpoint, forward clauses, augmentation, coreachability
//! - `builder`: accumulates facts and computes the active clause set
//! - `provenance`: immutable result with `I/O/H/D/R` ids
//! - `dump`: plain-text dictionaries for offline inspection

pub mod builder;
pub mod dob;
pub mod dump;
pub mod provenance;

pub use builder::ProvenanceBuilder;
pub use dob::DobSolver;
pub use provenance::{ProvId, Provenance};
