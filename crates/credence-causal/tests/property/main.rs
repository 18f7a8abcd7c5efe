//! Property tests for credence-causal.

mod categorical_properties;
