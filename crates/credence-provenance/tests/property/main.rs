//! Property tests for credence-provenance.

mod dob_properties;
