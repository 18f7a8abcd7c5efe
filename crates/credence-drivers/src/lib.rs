//! # credence-drivers
//!
//! Causal drivers own a private copy of a causal graph, accept batches of
//! boolean observations, and answer posterior queries by compiling the
//! graph and handing it to a solver backend.
//!
//! - `iterating`: one single-replica network per batch, priors overwritten online
//! - `oneshot`: the whole history unrolled into one network, priors read-only
//! - `em`: contradiction-filtered history fitted by the solver's EM
//! - `dynaboost`: structural learning over a differentiated copy of the graph
//!
//! [`DriverFactory`] selects the strategy by name.

pub mod driver;
pub mod dynaboost;
pub mod em;
pub mod factory;
pub mod iterating;
pub mod oneshot;

pub use driver::{update_all_factors, CausalDriver, DriverContext, DriverState, NodeKey, Observation};
pub use dynaboost::DynaboostDriver;
pub use em::EmDriver;
pub use factory::{DriverFactory, DriverKind};
pub use iterating::IteratingDriver;
pub use oneshot::OneShotDriver;
