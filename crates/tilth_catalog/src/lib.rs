//! Static schema catalog for Tilth.
//!
//! The catalog is the externally supplied, read-only schema: object
//! types bound to root tables, and attribute entries carrying the
//! parameter type, dimension axes, legal units, choice tokens, valid
//! object types, and behavior flags. It is loaded once at session
//! start and never mutated by the core.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod catalog;
mod entry;
mod loader;

pub use catalog::{Catalog, CatalogBuilder, ObjectType};
pub use entry::{CatalogEntry, EntryFlags, ParamType, UnitDef, Variant};
