//! Dependency-driven recomputation of derived attributes.
//!
//! Calc functions declare one output attribute and the inputs it reads.
//! External writes enqueue affected outputs; evaluation is pull based,
//! recursively computing inputs that are themselves derived, with a
//! generation-stamped memo so each cell is computed at most once per
//! change, and a visited stack guarding against dependency cycles.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod calc;
mod engine;

pub use calc::{CalcContext, CalcFn, CalcSpec};
pub use engine::{Engine, UpdateGuard};
