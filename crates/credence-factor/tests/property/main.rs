//! Property tests for credence-factor.

mod phony_properties;
