//! Fast hash collections used across the workspace.
//!
//! `FxHashMap`/`FxHashSet` for internal indexes keyed by dense ids,
//! `FxIndexMap`/`FxIndexSet` wherever iteration order is observable.

use std::hash::BuildHasherDefault;

pub use rustc_hash::{FxHashMap, FxHashSet, FxHasher};
pub use smallvec::SmallVec;

pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;
pub type FxIndexSet<T> = indexmap::IndexSet<T, BuildHasherDefault<FxHasher>>;
