//! Shared value types.

pub mod collections;
pub mod fact;

pub use fact::{ConstraintItem, Literal, Tuple};
