//! JSON catalog loader.
//!
//! The catalog is authored externally; this loader reads a JSON
//! projection of it. The format mirrors the builder surface:
//!
//! ```json
//! {
//!   "object_types": [{ "name": "SOIL", "table": "soils" }],
//!   "entries": [
//!     { "name": "CLAY", "param_type": "float",
//!       "units": [{ "name": "%", "factor": 1.0 }],
//!       "valid_objects": ["SOIL"] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::Deserialize;
use tilth_foundation::{Error, Result};

use crate::catalog::{Catalog, ObjectType};
use crate::entry::CatalogEntry;

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    object_types: Vec<ObjectType>,
    #[serde(default)]
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON,
    /// or fails catalog validation (duplicate names/tables).
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::not_found(format!("catalog file '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Parses a catalog from JSON text.
    ///
    /// # Errors
    /// Returns an error for malformed JSON or invalid catalog content.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(text)
            .map_err(|e| Error::validation(format!("catalog JSON: {e}")))?;
        let mut builder = Self::builder();
        for ot in file.object_types {
            builder = builder.object_type(ot.name, ot.table);
        }
        for mut entry in file.entries {
            // Apply the same axis-label filtering the builder does.
            entry.axes.retain(|a| !a.is_empty() && a != "1");
            builder = builder.entry(entry);
        }
        builder.build()
    }
}
