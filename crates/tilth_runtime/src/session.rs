//! The session: a thread-affine facade over the store and engine.
//!
//! Every public method follows the boundary contract: check liveness
//! and thread affinity, settle pending updates, do the work, and on
//! failure store the error text and return a sentinel instead of
//! propagating.

use std::path::Path;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tilth_catalog::{Catalog, Variant};
use tilth_engine::{CalcSpec, Engine};
use tilth_foundation::{Error, ObjectId, Result};
use tilth_store::{
    FindField, FindFlags, ObjectStore, OpenFlags, ReadOnly, SetOutcome, NARROW_SIZE_LIMIT,
};
use tracing::debug;

use crate::errors::ErrorChannel;

/// Sentinel returned by integer boundary calls on failure.
pub const RX_FAILURE: i32 = -1;

/// One client session over a catalog, store, and engine.
///
/// A session belongs to the thread that created it; calls from any
/// other thread fail at the boundary. After [`exit`](Self::exit)
/// every call fails.
pub struct Session {
    store: ObjectStore,
    engine: Engine,
    errors: ErrorChannel,
    thread: ThreadId,
    active: bool,
}

impl Session {
    /// Creates a session bound to the calling thread.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            store: ObjectStore::new(Arc::clone(&catalog)),
            engine: Engine::new(catalog),
            errors: ErrorChannel::new(),
            thread: thread::current().id(),
            active: true,
        }
    }

    /// Registers a calc function. Setup API, not a boundary call.
    ///
    /// # Errors
    /// Fails on an unknown output or duplicate registration.
    pub fn register_calc(&mut self, spec: CalcSpec) -> Result<()> {
        self.engine.register(spec)
    }

    /// Ends the session, force-closing every object and detaching the
    /// database. Every later call fails.
    pub fn exit(&mut self) -> i32 {
        let _ = self.engine.finish_updates(&mut self.store);
        self.store.close_all();
        if self.store.database().is_some() {
            let _ = self.store.close_database();
        }
        self.active = false;
        1
    }

    fn check(&self) -> Result<()> {
        if !self.active {
            return Err(Error::invalid_state("session has already exited"));
        }
        if thread::current().id() != self.thread {
            return Err(Error::invalid_state(
                "session used from a thread other than its owner",
            ));
        }
        Ok(())
    }

    fn fail<T>(&mut self, err: &Error, sentinel: T) -> T {
        debug!(error = %err, "boundary call failed");
        self.errors.set(&err.to_string());
        sentinel
    }

    fn index_arg(index: i32) -> Result<Option<usize>> {
        match index {
            -1 => Ok(None),
            i if i >= 0 => Ok(Some(usize::try_from(i).unwrap_or(0))),
            i => Err(Error::invalid_argument(format!("index {i} is negative"))),
        }
    }

    // ----- last error ---------------------------------------------

    /// The current last-error text.
    #[must_use]
    pub fn last_error(&self) -> &str {
        self.errors.last()
    }

    /// Writes the last-error text, honoring `+`/`-`/`=` composition
    /// prefixes.
    pub fn set_last_error(&mut self, message: &str) {
        self.errors.set(message);
    }

    /// Clears the last-error text.
    pub fn clear_last_error(&mut self) {
        self.errors.clear();
    }

    // ----- database -----------------------------------------------

    /// Opens the backing database. Returns 1, or -1 on failure.
    pub fn open_database(&mut self, path: impl AsRef<Path>, read_only: bool) -> i32 {
        let mode = if read_only {
            ReadOnly::Protected
        } else {
            ReadOnly::Writable
        };
        match self
            .check()
            .and_then(|()| self.store.open_database(path, mode))
        {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Closes the backing database. Returns 1, or -1 on failure
    /// (including when ordinary objects are still open).
    pub fn close_database(&mut self) -> i32 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            self.store.close_database()
        }) {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Tri-state write protection query: 1 read-only, 0 writable,
    /// -1 with no database open.
    pub fn is_read_only(&mut self) -> i32 {
        match self.check().and_then(|()| self.store.read_only()) {
            Ok(ReadOnly::Protected) => 1,
            Ok(ReadOnly::Writable) => 0,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Deletes a persisted record. Returns 1, or -1 on failure.
    pub fn delete_record(&mut self, path: &str) -> i32 {
        match self
            .check()
            .and_then(|()| self.store.delete_record(path))
        {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    // ----- object lifecycle ---------------------------------------

    /// Opens an object by name (magic source prefixes allowed).
    /// Returns the null handle on failure.
    pub fn open_object(&mut self, name: &str) -> ObjectId {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            self.store.open(name, OpenFlags::default())
        }) {
            Ok(id) => id,
            Err(e) => self.fail(&e, ObjectId::null()),
        }
    }

    /// Takes another reference on an object. Returns the new count,
    /// or -1 on failure.
    pub fn addref_object(&mut self, id: ObjectId) -> i32 {
        match self.check().and_then(|()| self.store.addref(id)) {
            Ok(refs) => i32::try_from(refs).unwrap_or(i32::MAX),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Drops a reference; at zero the object closes. Returns the
    /// remaining count, or -1 on failure.
    pub fn close_object(&mut self, id: ObjectId) -> i32 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            self.store.release(id)
        }) {
            Ok(refs) => i32::try_from(refs).unwrap_or(i32::MAX),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Writes an object back to the database. Returns 1, or -1.
    pub fn save_object(&mut self, id: ObjectId) -> i32 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            self.store.save_object(id)
        }) {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Writes an object under a new name (an `#XMLFILE:` name exports
    /// to that file instead). Returns 1, or -1.
    pub fn save_object_as(&mut self, id: ObjectId, name: &str) -> i32 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            self.store.save_object_as(id, name)
        }) {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Exports an object as XML projection text. `None` on failure.
    pub fn export_xml(&mut self, id: ObjectId) -> Option<String> {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            self.store.export_xml(id)
        }) {
            Ok(text) => Some(text),
            Err(e) => self.fail(&e, None),
        }
    }

    // ----- values -------------------------------------------------

    /// Reads one cell as text, in the attribute's carried variant.
    /// `index` of -1 reports the attribute's cursor index instead of
    /// reading a cell. `None` on failure.
    pub fn get_value(&mut self, id: ObjectId, attr: &str, unit: &str, index: i32) -> Option<String> {
        self.get_value_variant(id, attr, unit, index, Variant::Template)
    }

    /// Reads one cell as text with an explicit variant. `None` on
    /// failure.
    pub fn get_value_variant(
        &mut self,
        id: ObjectId,
        attr: &str,
        unit: &str,
        index: i32,
        variant: Variant,
    ) -> Option<String> {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            if index == -1 {
                // A cursor query, not a value read
                return Ok(self.store.attr_cursor(id, attr)?.to_string());
            }
            let index = Self::index_arg(index)?;
            self.store.get_value(id, attr, unit, index, variant)
        }) {
            Ok(text) => Some(text),
            Err(e) => self.fail(&e, None),
        }
    }

    /// Writes one cell from text. Returns 1 if the value changed,
    /// 0 if it was already stored, -1 on failure.
    pub fn set_value(
        &mut self,
        id: ObjectId,
        attr: &str,
        unit: &str,
        index: i32,
        raw: &str,
    ) -> i32 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            let index = Self::index_arg(index)?;
            let outcome = self.store.set_value(id, attr, unit, index, raw)?;
            if outcome == SetOutcome::Changed {
                let addr = self.store.resolve_attr(id, attr)?;
                self.engine
                    .note_external_write(&mut self.store, addr.object, &addr.attr)?;
            }
            Ok(outcome)
        }) {
            Ok(SetOutcome::Changed) => 1,
            Ok(SetOutcome::Unchanged) => 0,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Flat size of an attribute through the narrow accessor. Fails
    /// (with a hint toward the extended accessor) past 32767.
    pub fn get_size(&mut self, id: ObjectId, attr: &str) -> i32 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            let size = self.store.attr_size(id, attr)?;
            if size > NARROW_SIZE_LIMIT {
                return Err(Error::size_limit(size, NARROW_SIZE_LIMIT));
            }
            Ok(size)
        }) {
            Ok(size) => i32::try_from(size).unwrap_or(RX_FAILURE),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Flat size of an attribute without the narrow range limit.
    /// Returns -1 on failure.
    pub fn get_size_ex(&mut self, id: ObjectId, attr: &str) -> i64 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            self.store.attr_size(id, attr)
        }) {
            Ok(size) => i64::try_from(size).unwrap_or(i64::MAX),
            Err(e) => self.fail(&e, i64::from(RX_FAILURE)),
        }
    }

    /// Resizes the first axis of a named attribute, one row at a
    /// time. Returns 1 if the size changed, 0 if it was already at
    /// the target, -1 on failure.
    pub fn set_size(&mut self, id: ObjectId, attr: &str, size: i32) -> i32 {
        match self.check().and_then(|()| {
            self.engine.finish_updates(&mut self.store)?;
            let size = usize::try_from(size)
                .map_err(|_| Error::invalid_argument(format!("size {size} is negative")))?;
            let outcome = self.store.set_root_size(id, attr, size)?;
            if outcome == SetOutcome::Changed {
                let addr = self.store.resolve_attr(id, attr)?;
                self.engine
                    .note_external_write(&mut self.store, addr.object, &addr.attr)?;
            }
            Ok(outcome)
        }) {
            Ok(SetOutcome::Changed) => 1,
            Ok(SetOutcome::Unchanged) => 0,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// The attribute's cursor index, or -1 on failure.
    pub fn get_cursor(&mut self, id: ObjectId, attr: &str) -> i32 {
        match self.check().and_then(|()| self.store.attr_cursor(id, attr)) {
            Ok(cursor) => i32::try_from(cursor).unwrap_or(i32::MAX),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Sets the attribute's preferred unit. Returns 1, or -1.
    pub fn set_unit(&mut self, id: ObjectId, attr: &str, unit: &str) -> i32 {
        match self
            .check()
            .and_then(|()| self.store.set_attr_unit(id, attr, unit))
        {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Sets the attribute's carried read variant. Returns 1, or -1.
    pub fn set_variant(&mut self, id: ObjectId, attr: &str, variant: Variant) -> i32 {
        match self
            .check()
            .and_then(|()| self.store.set_attr_variant(id, attr, variant))
        {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    // ----- update engine ------------------------------------------

    /// Takes the update lock. Returns the new depth, or -1.
    pub fn lock_update(&mut self) -> i32 {
        match self.check() {
            Ok(()) => i32::try_from(self.engine.lock_update()).unwrap_or(i32::MAX),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Releases one level of the update lock. Returns the remaining
    /// depth, or -1 (including when the lock is not held).
    pub fn unlock_update(&mut self) -> i32 {
        match self.check().and_then(|()| self.engine.unlock_update()) {
            Ok(depth) => i32::try_from(depth).unwrap_or(i32::MAX),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Drains pending updates unless locked. Returns 1 if the queue
    /// ran, 0 if the lock deferred it, -1 on failure.
    pub fn run_updates(&mut self) -> i32 {
        match self.check().and_then(|()| self.engine.run(&mut self.store)) {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Drains pending updates regardless of autorun. Returns 1, or -1.
    pub fn finish_updates(&mut self) -> i32 {
        match self
            .check()
            .and_then(|()| self.engine.finish_updates(&mut self.store))
        {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Sets autorun; returns the previous setting as 1/0, or -1.
    pub fn set_autorun(&mut self, autorun: bool) -> i32 {
        match self.check() {
            Ok(()) => i32::from(self.engine.set_autorun(autorun)),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    // ----- find ---------------------------------------------------

    /// Runs a find query. Returns a cursor handle, or -1 on failure.
    pub fn find(&mut self, query: &str, flags: FindFlags) -> i32 {
        match self.check().and_then(|()| self.store.find(query, flags)) {
            Ok(cursor) => i32::try_from(cursor).unwrap_or(RX_FAILURE),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Number of hits behind a cursor, or -1 on failure.
    pub fn find_count(&mut self, cursor: i32) -> i32 {
        match self.check().and_then(|()| {
            let cursor = Self::cursor_arg(cursor)?;
            self.store.cursor_len(cursor)
        }) {
            Ok(len) => i32::try_from(len).unwrap_or(i32::MAX),
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    /// Projects a field of one hit by name. `None` on failure.
    pub fn find_field(&mut self, cursor: i32, index: i32, field: &str) -> Option<String> {
        match self.check().and_then(|()| {
            let cursor = Self::cursor_arg(cursor)?;
            let index = usize::try_from(index)
                .map_err(|_| Error::invalid_argument(format!("hit index {index} is negative")))?;
            let field = Self::field_arg(field)?;
            self.store.cursor_field(cursor, index, field)
        }) {
            Ok(text) => Some(text),
            Err(e) => self.fail(&e, None),
        }
    }

    /// Projects a field of the next hit, advancing the cursor.
    /// `None` at the end of the hits or on failure.
    pub fn find_next(&mut self, cursor: i32, field: &str) -> Option<String> {
        match self.check().and_then(|()| {
            let cursor = Self::cursor_arg(cursor)?;
            let field = Self::field_arg(field)?;
            self.store.cursor_next(cursor, field)
        }) {
            Ok(text) => text,
            Err(e) => self.fail(&e, None),
        }
    }

    /// Closes a find cursor. Returns 1, or -1.
    pub fn find_close(&mut self, cursor: i32) -> i32 {
        match self.check().and_then(|()| {
            let cursor = Self::cursor_arg(cursor)?;
            self.store.close_cursor(cursor)
        }) {
            Ok(()) => 1,
            Err(e) => self.fail(&e, RX_FAILURE),
        }
    }

    fn cursor_arg(cursor: i32) -> Result<u32> {
        u32::try_from(cursor)
            .map_err(|_| Error::invalid_argument(format!("cursor handle {cursor} is invalid")))
    }

    fn field_arg(field: &str) -> Result<FindField> {
        FindField::from_token(field)
            .ok_or_else(|| Error::invalid_argument(format!("no find field named '{field}'")))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("active", &self.active)
            .field("open_objects", &self.store.open_count())
            .finish_non_exhaustive()
    }
}
