//! Object and attribute storage for Tilth.
//!
//! This crate owns the mutable half of the data model:
//! - [`AttrInstance`] - dimensioned, unit-aware value cells
//! - [`FileObject`] - catalog-typed, reference-counted objects
//! - [`ObjectStore`] - the arena of open objects plus the backing
//!   database, find cursors, and import/export formats
//!
//! The store never runs calc functions itself; the dependency engine
//! drives recomputation through the internal write path
//! ([`ObjectStore::set_cell_internal`]).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod attr;
mod convert;
mod database;
mod find;
mod import;
mod object;
mod store;

pub use attr::AttrInstance;
pub use database::{Database, ReadOnly, Record};
pub use find::{CursorId, FindField, FindFlags, FindHit};
pub use import::OpenSource;
pub use object::{FileObject, ObjectCategory, ObjectSource};
pub use store::{AttrAddr, CursorGuard, ObjectStore, OpenFlags, SetOutcome};

/// Reserved value token growing the owning dimension by one row.
pub const TOKEN_INSERT: &str = "#INSERT";
/// Reserved value token shrinking the owning dimension by one row.
pub const TOKEN_DELETE: &str = "#DELETE";

/// Largest size reported by the narrow size accessor.
pub const NARROW_SIZE_LIMIT: usize = 32767;
