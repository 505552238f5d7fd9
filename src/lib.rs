//! Tilth - catalog-typed attribute store with a lock-gated
//! dependency-recomputation engine.
//!
//! This crate re-exports all layers of the Tilth system for convenient
//! access. For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: tilth_runtime    — Session boundary, error channel, console
//! Layer 3: tilth_engine     — Calc registry, update queue, memoized evaluation
//! Layer 2: tilth_store      — Objects, attribute cells, database, find, import
//! Layer 1: tilth_catalog    — Parameter schema: types, units, axes, flags
//! Layer 0: tilth_foundation — Core types (Value, ObjectId, ObjectPath, Error)
//! ```

pub use tilth_catalog as catalog;
pub use tilth_engine as engine;
pub use tilth_foundation as foundation;
pub use tilth_runtime as runtime;
pub use tilth_store as store;
