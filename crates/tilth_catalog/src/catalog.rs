//! The catalog: object types and entry lookup.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tilth_foundation::{Error, Result};

use crate::entry::CatalogEntry;

/// An object type bound to its root database table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    /// Type name, e.g. `"CLIMATE"`.
    pub name: String,
    /// Root table holding records of this type, e.g. `"climates"`.
    pub table: String,
}

/// The static schema: object types plus attribute entries.
///
/// Lookup is case-insensitive. The catalog is immutable once built;
/// the core only reads it.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: HashMap<String, Arc<CatalogEntry>>,
    object_types: Vec<ObjectType>,
}

impl Catalog {
    /// Starts building a catalog.
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Looks up an entry by name, case-insensitively.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Arc<CatalogEntry>> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    /// Returns the object type whose root table is `table`.
    #[must_use]
    pub fn object_type_for_table(&self, table: &str) -> Option<&ObjectType> {
        self.object_types
            .iter()
            .find(|t| t.table.eq_ignore_ascii_case(table))
    }

    /// Returns the object type by name.
    #[must_use]
    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.object_types
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// All object types, in declaration order.
    #[must_use]
    pub fn object_types(&self) -> &[ObjectType] {
        &self.object_types
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over all entries in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<CatalogEntry>> {
        self.entries.values()
    }
}

/// Builder for [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entries: Vec<CatalogEntry>,
    object_types: Vec<ObjectType>,
}

impl CatalogBuilder {
    /// Declares an object type bound to a root table.
    #[must_use]
    pub fn object_type(mut self, name: impl Into<String>, table: impl Into<String>) -> Self {
        self.object_types.push(ObjectType {
            name: name.into(),
            table: table.into(),
        });
        self
    }

    /// Adds an attribute entry.
    #[must_use]
    pub fn entry(mut self, entry: CatalogEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Finishes the catalog.
    ///
    /// # Errors
    /// Returns an error on duplicate entry names or duplicate tables.
    pub fn build(self) -> Result<Catalog> {
        let mut entries = HashMap::with_capacity(self.entries.len());
        for entry in self.entries {
            let key = entry.name.to_ascii_lowercase();
            if entries.insert(key, Arc::new(entry)).is_some() {
                return Err(Error::invalid_argument(
                    "duplicate catalog entry name".to_string(),
                ));
            }
        }
        for (i, a) in self.object_types.iter().enumerate() {
            for b in &self.object_types[i + 1..] {
                if a.table.eq_ignore_ascii_case(&b.table) {
                    return Err(Error::invalid_argument(format!(
                        "table '{}' bound to more than one object type",
                        a.table
                    )));
                }
            }
        }
        Ok(Catalog {
            entries,
            object_types: self.object_types,
        })
    }
}
