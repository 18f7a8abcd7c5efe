//! Span names for the four pipeline phases.
//!
//! Span macros need literal names, so the constants document the
//! names used across crates and let tests assert on them.

pub const PRUNE: &str = "credence.prune";
pub const BUILD_GRAPH: &str = "credence.build_graph";
pub const COMPILE: &str = "credence.compile";
pub const SOLVE: &str = "credence.solve";
pub const DRIVER_UPDATE: &str = "credence.driver_update";

/// All span names, in pipeline order.
pub const ALL: [&str; 5] = [PRUNE, BUILD_GRAPH, COMPILE, SOLVE, DRIVER_UPDATE];
