//! The backing database: a persisted image of object records.
//!
//! The on-disk format is a versioned MessagePack image of the record
//! list. Records store attribute values in protocol string form so the
//! image survives catalog evolution.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tilth_foundation::{Error, Result};
use tracing::debug;

/// Image format version; bumped on incompatible layout changes.
const IMAGE_VERSION: u32 = 1;

/// Write protection state of an open database.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReadOnly {
    /// Records may be added, changed, and deleted.
    Writable,
    /// The image is write-protected; mutation calls fail.
    Protected,
}

/// One persisted object record.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Record {
    /// Full `table\path\name` path, original spelling.
    pub path: String,
    /// Catalog object type name.
    pub object_type: String,
    /// Owner name (find-info metadata).
    #[serde(default)]
    pub owner: String,
    /// Group name (find-info metadata).
    #[serde(default)]
    pub group: String,
    /// Permission string (find-info metadata).
    #[serde(default)]
    pub perms: String,
    /// Last-modified stamp (find-info metadata).
    #[serde(default)]
    pub date: String,
    /// True for a folder placeholder rather than a data record.
    #[serde(default)]
    pub folder: bool,
    /// Dimension sizes, keyed by axis label.
    #[serde(default)]
    pub sizes: BTreeMap<String, usize>,
    /// Attribute cells in protocol string form, keyed by entry name.
    #[serde(default)]
    pub values: BTreeMap<String, Vec<String>>,
}

#[derive(Serialize, Deserialize)]
struct Image {
    version: u32,
    records: Vec<Record>,
}

/// An open database image.
///
/// Records are keyed by lowercased path. At most one database is open
/// per session; the store enforces that.
#[derive(Debug)]
pub struct Database {
    path: PathBuf,
    read_only: ReadOnly,
    dirty: bool,
    records: BTreeMap<String, Record>,
}

impl Database {
    /// Opens a database file, creating an empty in-memory image when
    /// the file does not exist yet.
    ///
    /// # Errors
    /// Returns an error for an unreadable or malformed image.
    pub fn open(path: impl AsRef<Path>, read_only: ReadOnly) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| {
                Error::not_found(format!("database '{}': {e}", path.display()))
            })?;
            let image: Image = rmp_serde::from_slice(&bytes).map_err(|e| {
                Error::validation(format!("database '{}': {e}", path.display()))
            })?;
            if image.version != IMAGE_VERSION {
                return Err(Error::validation(format!(
                    "database '{}' has image version {} (expected {IMAGE_VERSION})",
                    path.display(),
                    image.version
                )));
            }
            image
                .records
                .into_iter()
                .map(|r| (r.path.to_ascii_lowercase(), r))
                .collect()
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), records = records.len(), "database open");
        Ok(Self {
            path,
            read_only,
            dirty: false,
            records,
        })
    }

    /// The database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write protection state.
    #[must_use]
    pub fn read_only(&self) -> ReadOnly {
        self.read_only
    }

    /// True if unsaved record changes exist.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if the database holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by path, case-insensitively.
    #[must_use]
    pub fn record(&self, path: &str) -> Option<&Record> {
        self.records.get(&path.to_ascii_lowercase())
    }

    /// Iterates over all records in path order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Inserts or replaces a record.
    ///
    /// # Errors
    /// Fails when the database is write-protected.
    pub fn put(&mut self, record: Record) -> Result<()> {
        self.check_writable()?;
        self.records
            .insert(record.path.to_ascii_lowercase(), record);
        self.dirty = true;
        Ok(())
    }

    /// Deletes the record at `path`.
    ///
    /// # Errors
    /// Fails when write-protected or when no such record exists.
    pub fn delete(&mut self, path: &str) -> Result<()> {
        self.check_writable()?;
        if self.records.remove(&path.to_ascii_lowercase()).is_none() {
            return Err(Error::not_found(format!("no record at '{path}'")));
        }
        self.dirty = true;
        Ok(())
    }

    /// Writes the image back to disk if it has changed.
    ///
    /// # Errors
    /// Fails on serialization or I/O errors. A clean or protected
    /// database is a no-op.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty || self.read_only == ReadOnly::Protected {
            return Ok(());
        }
        let image = Image {
            version: IMAGE_VERSION,
            records: self.records.values().cloned().collect(),
        };
        let bytes = rmp_serde::to_vec_named(&image)
            .map_err(|e| Error::internal(format!("database image: {e}")))?;
        std::fs::write(&self.path, bytes).map_err(|e| {
            Error::internal(format!("database '{}': {e}", self.path.display()))
        })?;
        self.dirty = false;
        debug!(path = %self.path.display(), records = self.records.len(), "database saved");
        Ok(())
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only == ReadOnly::Protected {
            return Err(Error::invalid_state(format!(
                "database '{}' is open read-only",
                self.path.display()
            )));
        }
        Ok(())
    }
}
