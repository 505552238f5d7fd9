//! Open file objects: catalog-typed, reference-counted attribute owners.

use std::collections::HashMap;
use std::sync::Arc;

use tilth_catalog::CatalogEntry;
use tilth_foundation::{Error, ObjectPath, Result, Value};

use crate::attr::AttrInstance;
use crate::convert;

/// Where an open object's data came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ObjectSource {
    /// Loaded from (or destined for) the backing database.
    Database,
    /// Parsed from inline XML text.
    XmlText,
    /// Parsed from an XML file on disk.
    XmlFile,
    /// Built from a skeleton description (names only, default values).
    Skeleton,
    /// Extracted from a fileset archive.
    Fileset,
    /// Created empty in memory.
    Fresh,
}

/// Lifecycle category of an open object.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ObjectCategory {
    /// Opened explicitly by the caller; closed by refcount.
    Ordinary,
    /// Scratch object, never persisted.
    Temporary,
    /// Combined view object.
    Combo,
    /// Opened implicitly by following a pointer value. Force-closed
    /// when the database closes regardless of refcount.
    Lazy,
}

/// One open object: a path, a type, and its attribute instances.
///
/// Objects are reference counted. Dimension sizes live on the object
/// and are shared by every attribute declaring that axis; default size
/// of an axis never written to is 1.
#[derive(Clone, Debug)]
pub struct FileObject {
    path: ObjectPath,
    object_type: String,
    source: ObjectSource,
    category: ObjectCategory,
    refs: u32,
    keep_open: bool,
    dirty: bool,
    dims: HashMap<String, usize>,
    attrs: HashMap<String, AttrInstance>,
}

impl FileObject {
    /// Creates a freshly opened object with one reference.
    #[must_use]
    pub fn new(
        path: ObjectPath,
        object_type: impl Into<String>,
        source: ObjectSource,
        category: ObjectCategory,
    ) -> Self {
        Self {
            path,
            object_type: object_type.into(),
            source,
            category,
            refs: 1,
            keep_open: false,
            dirty: false,
            dims: HashMap::new(),
            attrs: HashMap::new(),
        }
    }

    /// The object's full path.
    #[must_use]
    pub fn path(&self) -> &ObjectPath {
        &self.path
    }

    /// Rebinds the object to a new path after a save-as.
    pub(crate) fn set_path(&mut self, path: ObjectPath) {
        self.path = path;
    }

    /// The object's catalog type name.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Where this object's data came from.
    #[must_use]
    pub fn source(&self) -> ObjectSource {
        self.source
    }

    /// The object's lifecycle category.
    #[must_use]
    pub fn category(&self) -> ObjectCategory {
        self.category
    }

    /// Promotes a lazily opened object to an ordinary one.
    pub fn set_category(&mut self, category: ObjectCategory) {
        self.category = category;
    }

    /// Current reference count.
    #[must_use]
    pub fn refs(&self) -> u32 {
        self.refs
    }

    /// Takes another reference; returns the new count.
    pub fn addref(&mut self) -> u32 {
        self.refs += 1;
        self.refs
    }

    /// Drops a reference; returns the new count. Saturates at zero.
    pub fn release(&mut self) -> u32 {
        self.refs = self.refs.saturating_sub(1);
        self.refs
    }

    /// True if the object stays loaded at zero references.
    #[must_use]
    pub fn keeps_open(&self) -> bool {
        self.keep_open
    }

    /// Marks the object as never auto-closing; only a bulk close
    /// releases it.
    pub fn set_keep_open(&mut self, keep: bool) {
        self.keep_open = keep;
    }

    /// True if the object has unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Marks the object as modified.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clears the modified flag (after a save).
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Size of a dimension axis; axes never resized are size 1.
    #[must_use]
    pub fn dim_size(&self, label: &str) -> usize {
        self.dims
            .get(&label.to_ascii_lowercase())
            .copied()
            .unwrap_or(1)
    }

    /// Sets an axis size directly, without touching existing attrs.
    /// Used when materializing an object from a record, before any
    /// attribute instance exists.
    pub(crate) fn set_dim(&mut self, label: &str, size: usize) {
        self.dims.insert(label.to_ascii_lowercase(), size.max(1));
    }

    /// Per-axis sizes for an entry, in axis order.
    #[must_use]
    pub fn sizes_for(&self, entry: &CatalogEntry) -> Vec<usize> {
        entry.axes.iter().map(|a| self.dim_size(a)).collect()
    }

    /// Looks up an existing attribute instance.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrInstance> {
        self.attrs.get(&name.to_ascii_lowercase())
    }

    /// Mutable lookup of an existing attribute instance.
    pub fn attr_mut(&mut self, name: &str) -> Option<&mut AttrInstance> {
        self.attrs.get_mut(&name.to_ascii_lowercase())
    }

    /// Returns the attribute instance for `entry`, creating it sized to
    /// the current dimension state and filled with the entry default.
    ///
    /// # Errors
    /// Returns an error if the entry's default value fails to parse.
    pub fn ensure_attr(&mut self, entry: &Arc<CatalogEntry>) -> Result<&mut AttrInstance> {
        let key = entry.name.to_ascii_lowercase();
        if !self.attrs.contains_key(&key) {
            let fill = Self::default_fill(entry)?;
            let sizes = self.sizes_for(entry);
            self.attrs
                .insert(key.clone(), AttrInstance::new(Arc::clone(entry), &sizes, &fill));
        }
        Ok(self.attrs.get_mut(&key).unwrap_or_else(|| unreachable!()))
    }

    fn default_fill(entry: &CatalogEntry) -> Result<Value> {
        match &entry.default {
            Some(raw) => convert::parse_raw(entry, 1.0, raw)
                .map_err(|e| e.with_context(format!("default of attr '{}'", entry.name))),
            None => Ok(Value::Nil),
        }
    }

    /// Iterates over all attribute instances.
    pub fn attrs(&self) -> impl Iterator<Item = &AttrInstance> {
        self.attrs.values()
    }

    /// Grows axis `label` by inserting one row at `index` in every
    /// attribute sharing the axis.
    ///
    /// # Errors
    /// Returns an error for an out-of-range insert index.
    pub fn insert_dim_row(&mut self, label: &str, index: usize) -> Result<()> {
        let old = self.dim_size(label);
        if index > old {
            return Err(Error::invalid_argument(format!(
                "insert index {index} past end of dimension '{label}' (size {old})"
            )));
        }
        for attr in self.attrs.values_mut() {
            let entry = Arc::clone(attr.entry());
            if let Some(axis) = axis_of(&entry, label) {
                let fill = Self::default_fill(&entry)?;
                attr.insert_row(axis, index, &fill)?;
            }
        }
        self.dims.insert(label.to_ascii_lowercase(), old + 1);
        self.dirty = true;
        Ok(())
    }

    /// Shrinks axis `label` by removing the row at `index` in every
    /// attribute sharing the axis.
    ///
    /// # Errors
    /// Returns an error for an out-of-range index or a size-1 axis.
    pub fn remove_dim_row(&mut self, label: &str, index: usize) -> Result<()> {
        let old = self.dim_size(label);
        if old <= 1 {
            return Err(Error::invalid_state(format!(
                "dimension '{label}' cannot shrink below one row"
            )));
        }
        if index >= old {
            return Err(Error::invalid_argument(format!(
                "delete index {index} out of range for dimension '{label}' (size {old})"
            )));
        }
        for attr in self.attrs.values_mut() {
            let entry = Arc::clone(attr.entry());
            if axis_of(&entry, label).is_some() {
                attr.remove_row(axis_of(&entry, label).unwrap_or(0), index)?;
            }
        }
        self.dims.insert(label.to_ascii_lowercase(), old - 1);
        self.dirty = true;
        Ok(())
    }
}

fn axis_of(entry: &CatalogEntry, label: &str) -> Option<usize> {
    entry.axes.iter().position(|a| a.eq_ignore_ascii_case(label))
}
