//! The object store: an arena of open objects, the backing database,
//! and find cursors.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tilth_catalog::{Catalog, CatalogEntry, Variant};
use tilth_foundation::{
    EntrySentinel, Error, ObjectId, ObjectPath, PointerValue, RemotePath, Result, Value,
};
use tracing::{debug, trace};

use crate::attr::AttrInstance;
use crate::convert;
use crate::database::{Database, ReadOnly, Record};
use crate::find::{self, CursorId, FindCursor, FindField, FindFlags};
use crate::import::{self, OpenSource};
use crate::object::{FileObject, ObjectCategory, ObjectSource};
use crate::{TOKEN_DELETE, TOKEN_INSERT};

/// Behavior flags for opening an object.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct OpenFlags {
    /// Open as a scratch object that is never persisted.
    pub temporary: bool,
    /// Fail instead of creating a fresh object when no record exists.
    pub must_exist: bool,
    /// Never auto-close at zero references; only a bulk close releases
    /// the object.
    pub keep_open: bool,
}

/// Result of an external value write.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SetOutcome {
    /// The stored value changed; dependents need recomputation.
    Changed,
    /// The write stored the value already present.
    Unchanged,
}

/// A resolved attribute address: the owning object (after any remote
/// hops) plus the canonical entry name.
#[derive(Clone, Debug)]
pub struct AttrAddr {
    /// The object holding the attribute.
    pub object: ObjectId,
    /// Canonical catalog entry name.
    pub attr: String,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    object: Option<FileObject>,
}

/// The arena of open objects plus the backing database.
///
/// Object handles are generational: a handle released back to zero
/// references goes stale and every later use fails cleanly.
#[derive(Debug)]
pub struct ObjectStore {
    catalog: Arc<Catalog>,
    slots: Vec<Slot>,
    free: Vec<u32>,
    by_path: HashMap<String, ObjectId>,
    database: Option<Database>,
    cursors: HashMap<CursorId, FindCursor>,
    next_cursor: CursorId,
    temp_counter: u32,
}

impl ObjectStore {
    /// Creates an empty store over a catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            slots: Vec::new(),
            free: Vec::new(),
            by_path: HashMap::new(),
            database: None,
            cursors: HashMap::new(),
            next_cursor: 1,
            temp_counter: 0,
        }
    }

    /// The catalog this store validates against.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    // ----- database lifecycle -------------------------------------

    /// Opens the backing database. At most one may be open; reopening
    /// the already-open path is a no-op.
    ///
    /// A path that does not exist yet opens as an empty image.
    ///
    /// # Errors
    /// Fails when another database is open, objects are open, or the
    /// image is bad.
    pub fn open_database(&mut self, path: impl AsRef<Path>, read_only: ReadOnly) -> Result<()> {
        let path = Self::trim_separators(path.as_ref());
        if let Some(db) = &self.database {
            if db.path() == path {
                return Ok(());
            }
            return Err(Error::invalid_state(
                "a database is already open; close it first",
            ));
        }
        if self.open_count() > 0 {
            return Err(Error::invalid_state(
                "objects are open; close them before opening a database",
            ));
        }
        self.database = Some(Database::open(path, read_only)?);
        Ok(())
    }

    fn trim_separators(path: &Path) -> PathBuf {
        let text = path.to_string_lossy();
        PathBuf::from(text.trim_end_matches(['\\', '/']))
    }

    /// Closes the backing database, saving changes first.
    ///
    /// Temporary, combo, and lazily opened objects are force-closed.
    /// Any remaining ordinary object blocks the close.
    ///
    /// # Errors
    /// Fails when no database is open or ordinary objects remain open.
    pub fn close_database(&mut self) -> Result<()> {
        if self.database.is_none() {
            return Err(Error::invalid_state("no database is open"));
        }
        // Transient categories go down with the database; only
        // ordinary objects pin it.
        let transient: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| match &s.object {
                Some(o) if o.category() != ObjectCategory::Ordinary => {
                    Some(u32::try_from(i).unwrap_or(u32::MAX))
                }
                _ => None,
            })
            .collect();
        for index in transient {
            self.free_slot(index);
        }
        if let Some(open) = self.slots.iter().find_map(|s| s.object.as_ref()) {
            return Err(Error::invalid_state(format!(
                "cannot close database: object '{}' is still open",
                open.path()
            )));
        }
        let mut db = self.database.take().unwrap_or_else(|| unreachable!());
        let saved = db.save();
        self.cursors.clear();
        debug!(path = %db.path().display(), "database closed");
        saved
    }

    /// The open database, if any.
    #[must_use]
    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    /// Write protection of the open database.
    ///
    /// # Errors
    /// Fails when no database is open.
    pub fn read_only(&self) -> Result<ReadOnly> {
        self.database
            .as_ref()
            .map(Database::read_only)
            .ok_or_else(|| Error::invalid_state("no database is open"))
    }

    /// Deletes a persisted record.
    ///
    /// # Errors
    /// Fails when no database is open, it is write-protected, or no
    /// such record exists.
    pub fn delete_record(&mut self, path: &str) -> Result<()> {
        self.database_mut()?.delete(path)
    }

    fn database_mut(&mut self) -> Result<&mut Database> {
        self.database
            .as_mut()
            .ok_or_else(|| Error::invalid_state("no database is open"))
    }

    // ----- object lifecycle ---------------------------------------

    /// Opens an object by name.
    ///
    /// The name may carry a magic source prefix (`#XML:`, `#XMLFILE:`,
    /// `#SKEL:`, `#FILESET:`); a plain name opens from the database,
    /// or creates a fresh object when no record exists. Opening a path
    /// that is already open takes another reference on it.
    ///
    /// # Errors
    /// Fails on bad source text, a missing record under `must_exist`,
    /// or an unknown object type.
    pub fn open(&mut self, name: &str, flags: OpenFlags) -> Result<ObjectId> {
        let id = match OpenSource::parse(name) {
            OpenSource::Native(path) => self.open_native(&path, flags),
            OpenSource::XmlText(text) => {
                let record = import::parse_xml(&text)?;
                self.materialize(&record, ObjectSource::XmlText, Self::category_for(flags))
            }
            OpenSource::XmlFile(path) => {
                let text = std::fs::read_to_string(&path).map_err(|e| {
                    Error::not_found(format!("xml file '{path}': {e}"))
                })?;
                let record = import::parse_xml(&text)?;
                self.materialize(&record, ObjectSource::XmlFile, Self::category_for(flags))
            }
            OpenSource::Skeleton(text) => {
                let record = import::parse_skeleton(&text)?;
                self.materialize(&record, ObjectSource::Skeleton, Self::category_for(flags))
            }
            OpenSource::Fileset(path) => {
                let records = import::read_fileset(&path)?;
                let mut first = None;
                for record in &records {
                    let id =
                        self.materialize(record, ObjectSource::Fileset, Self::category_for(flags))?;
                    first.get_or_insert(id);
                }
                first.ok_or_else(|| {
                    Error::validation(format!("fileset '{path}' holds no objects"))
                })
            }
        }?;
        if flags.keep_open {
            self.get_mut(id)?.set_keep_open(true);
        }
        Ok(id)
    }

    fn category_for(flags: OpenFlags) -> ObjectCategory {
        if flags.temporary {
            ObjectCategory::Temporary
        } else {
            ObjectCategory::Ordinary
        }
    }

    fn open_native(&mut self, name: &str, flags: OpenFlags) -> Result<ObjectId> {
        if let Some((base, sentinel)) = Self::split_sentinel(name) {
            return self.open_sentinel(base, sentinel);
        }
        let path = ObjectPath::parse(name)?;
        if let Some(&id) = self.by_path.get(path.key()) {
            let object = self.get_mut(id)?;
            // Reopening a pointer-hop object pins it like any other
            if object.category() == ObjectCategory::Lazy {
                object.set_category(ObjectCategory::Ordinary);
            }
            object.addref();
            return Ok(id);
        }
        let record = self
            .database
            .as_ref()
            .and_then(|db| db.record(path.key()))
            .cloned();
        match record {
            Some(record) => {
                self.materialize(&record, ObjectSource::Database, Self::category_for(flags))
            }
            None if flags.must_exist => Err(Error::not_found(format!(
                "no record at '{}'",
                path.full()
            ))),
            None => {
                let object_type = self.type_for_table(&path)?.to_string();
                let object = FileObject::new(
                    path,
                    object_type,
                    ObjectSource::Fresh,
                    Self::category_for(flags),
                );
                Ok(self.insert_object(object))
            }
        }
    }

    fn split_sentinel(name: &str) -> Option<(&str, EntrySentinel)> {
        let (base, last) = name.rsplit_once(['\\', '/'])?;
        Some((base, EntrySentinel::from_token(last)?))
    }

    /// Opens a fresh instance selected by an entry sentinel instead of
    /// a stored record. Each open yields a distinct scratch object.
    fn open_sentinel(&mut self, base: &str, sentinel: EntrySentinel) -> Result<ObjectId> {
        let path = ObjectPath::parse(base)?;
        let object_type = self.type_for_table(&path)?.to_string();
        self.temp_counter += 1;
        let spawn = ObjectPath::parse(&format!(
            "{}\\{}{}",
            path.table(),
            sentinel.token().trim_start_matches('#').to_ascii_lowercase(),
            self.temp_counter
        ))?;
        let object = FileObject::new(
            spawn,
            object_type,
            ObjectSource::Fresh,
            ObjectCategory::Temporary,
        );
        Ok(self.insert_object(object))
    }

    /// Opens the target of a pointer hop. An already-open target is
    /// used as-is: resolution is a read and leaves its refcount
    /// untouched. A target not yet loaded is materialized as lazy so
    /// the database close tears it down.
    fn open_lazy(&mut self, path: &ObjectPath) -> Result<ObjectId> {
        if let Some(&id) = self.by_path.get(path.key()) {
            return Ok(id);
        }
        let record = self
            .database
            .as_ref()
            .and_then(|db| db.record(path.key()))
            .cloned()
            .ok_or_else(|| {
                Error::not_found(format!("pointer target '{}' has no record", path.full()))
            })?;
        self.materialize(&record, ObjectSource::Database, ObjectCategory::Lazy)
    }

    fn type_for_table(&self, path: &ObjectPath) -> Result<&str> {
        self.catalog
            .object_type_for_table(path.table())
            .map(|t| t.name.as_str())
            .ok_or_else(|| {
                Error::not_found(format!(
                    "no object type is bound to table '{}'",
                    path.table()
                ))
            })
    }

    fn materialize(
        &mut self,
        record: &Record,
        source: ObjectSource,
        category: ObjectCategory,
    ) -> Result<ObjectId> {
        let path = if record.path.is_empty() {
            self.temp_counter += 1;
            ObjectPath::parse(&format!("temp\\object{}", self.temp_counter))?
        } else {
            ObjectPath::parse(&record.path)?
        };
        if self.catalog.object_type(&record.object_type).is_none() {
            return Err(Error::not_found(format!(
                "unknown object type '{}'",
                record.object_type
            )));
        }
        let mut object = FileObject::new(path, record.object_type.clone(), source, category);
        for (axis, size) in &record.sizes {
            object.set_dim(axis, *size);
        }
        for (name, cells) in &record.values {
            let entry = self.lookup_entry(name)?;
            let attr = object.ensure_attr(&entry)?;
            for (i, raw) in cells.iter().enumerate() {
                let value = convert::parse_raw(&entry, 1.0, raw)
                    .map_err(|e| e.with_context(format!("record '{}'", record.path)))?;
                attr.set_cell(i, value, false)?;
            }
            attr.set_cursor(0);
        }
        object.clear_dirty();
        Ok(self.insert_object(object))
    }

    fn insert_object(&mut self, object: FileObject) -> ObjectId {
        let key = object.path().key().to_string();
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.object = Some(object);
                ObjectId::new(index, slot.generation)
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    object: Some(object),
                });
                ObjectId::new(index, 0)
            }
        };
        trace!(%id, path = %key, "object opened");
        self.by_path.insert(key, id);
        id
    }

    fn free_slot(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        if let Some(object) = slot.object.take() {
            self.by_path.remove(object.path().key());
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index);
            trace!(path = %object.path(), "object closed");
        }
    }

    /// Takes another reference on an open object; returns the count.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn addref(&mut self, id: ObjectId) -> Result<u32> {
        Ok(self.get_mut(id)?.addref())
    }

    /// Drops a reference; at zero the object closes and its handle
    /// goes stale. A keep-open object stays loaded at zero references
    /// until a bulk close. Returns the remaining count.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn release(&mut self, id: ObjectId) -> Result<u32> {
        let object = self.get_mut(id)?;
        let refs = object.release();
        if refs == 0 && !object.keeps_open() {
            self.free_slot(id.index);
        }
        Ok(refs)
    }

    /// Looks up an open object by handle.
    ///
    /// # Errors
    /// Fails for a stale or never-issued handle.
    pub fn get(&self, id: ObjectId) -> Result<&FileObject> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.object.as_ref())
            .ok_or_else(|| Error::invalid_argument(format!("{id} is not open")))
    }

    /// Mutable handle lookup.
    ///
    /// # Errors
    /// Fails for a stale or never-issued handle.
    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut FileObject> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.object.as_mut())
            .ok_or_else(|| Error::invalid_argument(format!("{id} is not open")))
    }

    /// Looks up an open object by path.
    #[must_use]
    pub fn find_open(&self, path: &ObjectPath) -> Option<ObjectId> {
        self.by_path.get(path.key()).copied()
    }

    /// Number of open objects.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|s| s.object.is_some()).count()
    }

    /// Handles of every open object.
    #[must_use]
    pub fn open_ids(&self) -> Vec<ObjectId> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.object
                    .as_ref()
                    .map(|_| ObjectId::new(u32::try_from(i).unwrap_or(u32::MAX), s.generation))
            })
            .collect()
    }

    /// Closes every open object regardless of refcount, invalidating
    /// all outstanding handles.
    pub fn close_all(&mut self) {
        let open: Vec<u32> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.object
                    .as_ref()
                    .map(|_| u32::try_from(i).unwrap_or(u32::MAX))
            })
            .collect();
        for index in open {
            self.free_slot(index);
        }
    }

    // ----- persistence --------------------------------------------

    /// Writes an open object back to the database as a record.
    ///
    /// # Errors
    /// Fails with no database, a protected database, or a stale handle.
    pub fn save_object(&mut self, id: ObjectId) -> Result<()> {
        let record = self.record_from(id)?;
        self.database_mut()?.put(record)?;
        self.get_mut(id)?.clear_dirty();
        Ok(())
    }

    /// Writes an object to the database under a new name, rebinding
    /// the in-memory object to it. An `#XMLFILE:` name exports XML to
    /// that file instead and leaves the object untouched.
    ///
    /// # Errors
    /// Fails on a stale handle, an occupied target path, a protected
    /// database, or an unsupported name prefix.
    pub fn save_object_as(&mut self, id: ObjectId, name: &str) -> Result<()> {
        match OpenSource::parse(name) {
            OpenSource::XmlFile(file) => {
                let xml = self.export_xml(id)?;
                std::fs::write(&file, xml)
                    .map_err(|e| Error::internal(format!("writing '{file}': {e}")))
            }
            OpenSource::Native(text) => {
                let path = ObjectPath::parse(&text)?;
                if self
                    .by_path
                    .get(path.key())
                    .is_some_and(|&other| other != id)
                {
                    return Err(Error::invalid_state(format!(
                        "'{}' is already open",
                        path.full()
                    )));
                }
                let mut record = self.record_from(id)?;
                record.path = path.full().to_string();
                self.database_mut()?.put(record)?;
                let old_key = self.get(id)?.path().key().to_string();
                self.by_path.remove(&old_key);
                self.by_path.insert(path.key().to_string(), id);
                let object = self.get_mut(id)?;
                object.set_path(path);
                object.clear_dirty();
                Ok(())
            }
            _ => Err(Error::invalid_argument(format!(
                "'{name}' is not a valid save target"
            ))),
        }
    }

    /// Projects an open object into record form.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn record_from(&self, id: ObjectId) -> Result<Record> {
        let object = self.get(id)?;
        let mut record = Record {
            path: object.path().full().to_string(),
            object_type: object.object_type().to_string(),
            ..Record::default()
        };
        for attr in object.attrs() {
            let entry = attr.entry();
            for axis in &entry.axes {
                record
                    .sizes
                    .insert(axis.clone(), object.dim_size(axis));
            }
            let cells = attr
                .cells()
                .iter()
                .map(|v| convert::format_value(entry, 1.0, v))
                .collect();
            record.values.insert(entry.name.clone(), cells);
        }
        Ok(record)
    }

    /// Exports an open object as XML projection text.
    ///
    /// # Errors
    /// Fails for a stale handle.
    pub fn export_xml(&self, id: ObjectId) -> Result<String> {
        Ok(import::to_xml(&self.record_from(id)?))
    }

    /// Writes a fileset archive holding the given objects.
    ///
    /// # Errors
    /// Fails for a stale handle or on I/O errors.
    pub fn export_fileset(&self, path: impl AsRef<Path>, ids: &[ObjectId]) -> Result<()> {
        let records: Vec<Record> = ids
            .iter()
            .map(|&id| self.record_from(id))
            .collect::<Result<_>>()?;
        import::write_fileset(path, &records)
    }

    // ----- attribute resolution and values ------------------------

    fn lookup_entry(&self, name: &str) -> Result<Arc<CatalogEntry>> {
        self.catalog.lookup(name).cloned().ok_or_else(|| {
            Error::not_found(format!("no catalog parameter named '{name}'"))
        })
    }

    /// Resolves an attribute name against an object, following remote
    /// `#RD:` pointer chains by lazily opening each hop target.
    ///
    /// # Errors
    /// Fails on unknown parameters, entries invalid for the object's
    /// type, or unset pointer hops.
    pub fn resolve_attr(&mut self, id: ObjectId, name: &str) -> Result<AttrAddr> {
        let (object, attr_name) = match RemotePath::parse(name)? {
            Some(remote) => {
                let mut current = id;
                for hop in &remote.hops {
                    current = self.follow_hop(current, hop)?;
                }
                (current, remote.attr)
            }
            None => (id, name.to_string()),
        };
        let entry = self.lookup_entry(&attr_name)?;
        let object_type = self.get(object)?.object_type().to_string();
        if !entry.valid_objects.is_empty() && !entry.is_valid_object(&object_type) {
            return Err(Error::validation(format!(
                "attr '{}' is not valid on object type '{object_type}'",
                entry.name
            )));
        }
        Ok(AttrAddr {
            object,
            attr: entry.name.clone(),
        })
    }

    fn follow_hop(&mut self, id: ObjectId, hop: &str) -> Result<ObjectId> {
        let entry = self.lookup_entry(hop)?;
        let object = self.get_mut(id)?;
        let attr = object.ensure_attr(&entry)?;
        let cursor = attr.cursor();
        let target = match attr.cell(cursor)? {
            Value::Ref(PointerValue::Path(p)) => p.clone(),
            Value::Ref(PointerValue::Sentinel(s)) => {
                return Err(Error::invalid_state(format!(
                    "pointer '{hop}' holds {} and cannot be followed",
                    s.token()
                )));
            }
            _ => {
                return Err(Error::invalid_state(format!(
                    "pointer '{hop}' is unset"
                )));
            }
        };
        self.open_lazy(&target)
    }

    /// Reads one cell as protocol text.
    ///
    /// `index` of `None` reads at the attribute's cursor. The variant
    /// chooses interval or cumulative interpretation; `Template`
    /// defers to the variant the attribute carries.
    ///
    /// # Errors
    /// Fails on resolution errors, bad units, or bad indexes.
    pub fn get_value(
        &mut self,
        id: ObjectId,
        name: &str,
        unit: &str,
        index: Option<usize>,
        variant: Variant,
    ) -> Result<String> {
        let addr = self.resolve_attr(id, name)?;
        let entry = self.lookup_entry(&addr.attr)?;
        let object = self.get_mut(addr.object)?;
        let attr = object.ensure_attr(&entry)?;
        let index = index.unwrap_or_else(|| attr.cursor());
        let factor = convert::resolve_factor(&entry, unit, attr.unit())?;
        let variant = match variant {
            Variant::Template => attr.variant(),
            Variant::Catalog => Variant::Interval,
            v => v,
        };
        let value = match variant {
            Variant::Cumulative => {
                attr.cell(index)?; // index check
                convert::cumulative(attr.cells(), index)
            }
            _ => attr.cell(index)?.clone(),
        };
        Ok(convert::format_value(&entry, factor, &value))
    }

    /// Writes one cell from protocol text on behalf of the user.
    ///
    /// The reserved tokens `#INSERT` and `#DELETE` resize the entry's
    /// first axis at `index` instead of storing a value.
    ///
    /// # Errors
    /// Fails on resolution, validation, edit-protection, or resize
    /// errors.
    pub fn set_value(
        &mut self,
        id: ObjectId,
        name: &str,
        unit: &str,
        index: Option<usize>,
        raw: &str,
    ) -> Result<SetOutcome> {
        let addr = self.resolve_attr(id, name)?;
        let entry = self.lookup_entry(&addr.attr)?;
        if entry.flags.no_user_edit {
            return Err(Error::validation(format!(
                "attr '{}' cannot be edited",
                entry.name
            )));
        }
        if raw == TOKEN_INSERT || raw == TOKEN_DELETE {
            return self.resize_token(addr.object, &entry, index, raw);
        }
        let object = self.get_mut(addr.object)?;
        let attr = object.ensure_attr(&entry)?;
        let index = index.unwrap_or_else(|| attr.cursor());
        let factor = convert::resolve_factor(&entry, unit, attr.unit())?;
        let value = convert::parse_raw(&entry, factor, raw)?;
        let changed = attr.set_cell(index, value, false)?;
        if changed {
            object.mark_dirty();
            Ok(SetOutcome::Changed)
        } else {
            Ok(SetOutcome::Unchanged)
        }
    }

    /// The first axis of a resizable entry. Scalars and
    /// resize-protected entries fail.
    fn resizable_axis(entry: &CatalogEntry) -> Result<String> {
        if entry.flags.no_resize {
            return Err(Error::validation(format!(
                "attr '{}' does not allow resizing",
                entry.name
            )));
        }
        entry.axes.first().cloned().ok_or_else(|| {
            Error::invalid_argument(format!(
                "attr '{}' is scalar and cannot be resized",
                entry.name
            ))
        })
    }

    fn resize_token(
        &mut self,
        id: ObjectId,
        entry: &Arc<CatalogEntry>,
        index: Option<usize>,
        token: &str,
    ) -> Result<SetOutcome> {
        let axis = Self::resizable_axis(entry)?;
        let object = self.get_mut(id)?;
        object.ensure_attr(entry)?;
        let index = index.unwrap_or(0);
        if token == TOKEN_INSERT {
            object.insert_dim_row(&axis, index)?;
        } else {
            object.remove_dim_row(&axis, index)?;
        }
        Ok(SetOutcome::Changed)
    }

    /// Writes one typed cell on behalf of the recompute engine.
    ///
    /// Engine writes carry computed provenance: they do not move the
    /// cursor and do not dirty the object. Returns true on change.
    ///
    /// # Errors
    /// Fails on resolution or index errors.
    pub fn set_cell_internal(
        &mut self,
        id: ObjectId,
        name: &str,
        index: usize,
        value: Value,
    ) -> Result<bool> {
        let entry = self.lookup_entry(name)?;
        let object = self.get_mut(id)?;
        let attr = object.ensure_attr(&entry)?;
        attr.set_cell(index, value, true)
    }

    /// Reads one typed cell without formatting.
    ///
    /// # Errors
    /// Fails on resolution or index errors.
    pub fn cell(&mut self, id: ObjectId, name: &str, index: usize) -> Result<Value> {
        let entry = self.lookup_entry(name)?;
        let object = self.get_mut(id)?;
        let attr = object.ensure_attr(&entry)?;
        Ok(attr.cell(index)?.clone())
    }

    /// Flat cell count of an attribute (1 for scalars).
    ///
    /// # Errors
    /// Fails on resolution errors.
    pub fn attr_size(&mut self, id: ObjectId, name: &str) -> Result<usize> {
        let addr = self.resolve_attr(id, name)?;
        let entry = self.lookup_entry(&addr.attr)?;
        let object = self.get_mut(addr.object)?;
        Ok(object.ensure_attr(&entry)?.size())
    }

    /// The attribute's cursor index.
    ///
    /// # Errors
    /// Fails on resolution errors.
    pub fn attr_cursor(&mut self, id: ObjectId, name: &str) -> Result<usize> {
        let addr = self.resolve_attr(id, name)?;
        let entry = self.lookup_entry(&addr.attr)?;
        let object = self.get_mut(addr.object)?;
        Ok(object.ensure_attr(&entry)?.cursor())
    }

    /// Sets the attribute's preferred (template) unit.
    ///
    /// # Errors
    /// Fails for a unit the entry does not allow.
    pub fn set_attr_unit(&mut self, id: ObjectId, name: &str, unit: &str) -> Result<()> {
        let addr = self.resolve_attr(id, name)?;
        let entry = self.lookup_entry(&addr.attr)?;
        if !entry.is_valid_unit(unit) {
            return Err(Error::invalid_argument(format!(
                "unit '{unit}' is not valid for attr '{}'",
                entry.name
            )));
        }
        let object = self.get_mut(addr.object)?;
        let attr = object.ensure_attr(&entry)?;
        if unit.is_empty() || unit.eq_ignore_ascii_case("#U_TEMPLATE") {
            attr.set_unit(None);
        } else {
            attr.set_unit(Some(unit.to_string()));
        }
        Ok(())
    }

    /// Sets the attribute's carried read variant.
    ///
    /// # Errors
    /// Fails on resolution errors.
    pub fn set_attr_variant(&mut self, id: ObjectId, name: &str, variant: Variant) -> Result<()> {
        let addr = self.resolve_attr(id, name)?;
        let entry = self.lookup_entry(&addr.attr)?;
        let object = self.get_mut(addr.object)?;
        object.ensure_attr(&entry)?.set_variant(variant);
        Ok(())
    }

    /// Resizes the first axis of a named attribute, one row at a time.
    ///
    /// The name resolves like any other attribute access, remote
    /// chains included, then the entry's first axis is resized on the
    /// owning object. Growth inserts after the current tail; shrinkage
    /// deletes from the tail backward. Every attribute sharing the
    /// axis follows each step.
    ///
    /// # Errors
    /// Fails for an unknown or scalar or resize-protected attribute,
    /// a zero target size, or a stale handle.
    pub fn set_root_size(&mut self, id: ObjectId, name: &str, size: usize) -> Result<SetOutcome> {
        let addr = self.resolve_attr(id, name)?;
        let entry = self.lookup_entry(&addr.attr)?;
        let axis = Self::resizable_axis(&entry)?;
        if size == 0 {
            return Err(Error::invalid_argument(format!(
                "attr '{}' cannot be resized to zero rows",
                entry.name
            )));
        }
        let object = self.get_mut(addr.object)?;
        object.ensure_attr(&entry)?;
        if object.dim_size(&axis) == size {
            return Ok(SetOutcome::Unchanged);
        }
        while object.dim_size(&axis) < size {
            let tail = object.dim_size(&axis);
            object.insert_dim_row(&axis, tail)?;
        }
        while object.dim_size(&axis) > size {
            let tail = object.dim_size(&axis) - 1;
            object.remove_dim_row(&axis, tail)?;
        }
        Ok(SetOutcome::Changed)
    }

    // ----- find cursors -------------------------------------------

    /// Runs a find query, returning a cursor handle over the hits.
    ///
    /// # Errors
    /// Fails when no database is open or the query is malformed.
    pub fn find(&mut self, query: &str, flags: FindFlags) -> Result<CursorId> {
        let db = self
            .database
            .as_ref()
            .ok_or_else(|| Error::invalid_state("no database is open"))?;
        let hits = find::search(db, query, flags)?;
        let id = self.next_cursor;
        self.next_cursor += 1;
        self.cursors.insert(id, FindCursor::new(hits));
        Ok(id)
    }

    /// Runs a find query behind a guard that closes the cursor on drop.
    ///
    /// # Errors
    /// Fails when no database is open or the query is malformed.
    pub fn find_scoped(&mut self, query: &str, flags: FindFlags) -> Result<CursorGuard<'_>> {
        let id = self.find(query, flags)?;
        Ok(CursorGuard { store: self, id })
    }

    /// Number of hits behind a cursor.
    ///
    /// # Errors
    /// Fails for an unknown cursor.
    pub fn cursor_len(&self, cursor: CursorId) -> Result<usize> {
        Ok(self.cursor(cursor)?.len())
    }

    /// Projects a field of one hit.
    ///
    /// # Errors
    /// Fails for an unknown cursor or an out-of-range hit index.
    pub fn cursor_field(
        &self,
        cursor: CursorId,
        index: usize,
        field: FindField,
    ) -> Result<String> {
        self.cursor(cursor)?
            .hit(index)
            .map(|h| h.field(field))
            .ok_or_else(|| {
                Error::invalid_argument(format!("cursor hit index {index} out of range"))
            })
    }

    /// Projects a field of the next hit, advancing the cursor.
    /// Returns `None` at the end.
    ///
    /// # Errors
    /// Fails for an unknown cursor.
    pub fn cursor_next(&mut self, cursor: CursorId, field: FindField) -> Result<Option<String>> {
        let c = self
            .cursors
            .get_mut(&cursor)
            .ok_or_else(|| Error::invalid_argument(format!("no find cursor {cursor}")))?;
        Ok(c.advance().map(|h| h.field(field)))
    }

    /// Closes a find cursor.
    ///
    /// # Errors
    /// Fails for an unknown cursor.
    pub fn close_cursor(&mut self, cursor: CursorId) -> Result<()> {
        self.cursors
            .remove(&cursor)
            .map(|_| ())
            .ok_or_else(|| Error::invalid_argument(format!("no find cursor {cursor}")))
    }

    fn cursor(&self, cursor: CursorId) -> Result<&FindCursor> {
        self.cursors
            .get(&cursor)
            .ok_or_else(|| Error::invalid_argument(format!("no find cursor {cursor}")))
    }
}

/// A find cursor that closes itself when dropped.
pub struct CursorGuard<'a> {
    store: &'a mut ObjectStore,
    id: CursorId,
}

impl CursorGuard<'_> {
    /// The underlying cursor handle.
    #[must_use]
    pub fn id(&self) -> CursorId {
        self.id
    }

    /// Number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.cursor_len(self.id).unwrap_or(0)
    }

    /// True if the query produced no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Projects a field of one hit.
    #[must_use]
    pub fn field(&self, index: usize, field: FindField) -> Option<String> {
        self.store.cursor_field(self.id, index, field).ok()
    }

    /// Projects a field of the next hit, advancing the cursor.
    pub fn next_field(&mut self, field: FindField) -> Option<String> {
        self.store.cursor_next(self.id, field).ok().flatten()
    }
}

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        let _ = self.store.close_cursor(self.id);
    }
}
