//! Core types for the Tilth attribute store.
//!
//! This crate provides:
//! - [`Value`] - The typed cell value for all attribute data
//! - [`SimDate`] - Simulation-relative dates
//! - [`ObjectId`] - Generational object handles
//! - [`ObjectPath`] - Case-insensitive `table\path\name` identities
//! - [`RemotePath`] - Parsed `#RD:` pointer-hop attribute paths
//! - [`Error`] - Error types shared by every Tilth crate

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod date;
mod error;
mod id;
mod path;
mod remote;
mod value;

pub use date::SimDate;
pub use error::{Error, ErrorKind, Result};
pub use id::ObjectId;
pub use path::ObjectPath;
pub use remote::RemotePath;
pub use value::{EntrySentinel, PointerValue, Value};

/// Maximum accepted length for an attribute value string.
///
/// Longer strings are rejected with a validation error at the
/// set-value boundary.
pub const MAX_VALUE_LEN: usize = 4096;
