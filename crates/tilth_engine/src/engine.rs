//! The update engine: lock discipline, the pending queue, and
//! memoized pull-based evaluation.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use tilth_catalog::Catalog;
use tilth_foundation::{Error, ObjectId, RemotePath, Result, Value};
use tilth_store::ObjectStore;
use tracing::{debug, trace};

use crate::calc::{CalcContext, CalcSpec};

/// Recursion ceiling for pull evaluation. A well-formed calc graph
/// never gets near this; hitting it means an undetected cycle.
const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
struct WorkItem {
    object: ObjectId,
    attr: String,
}

/// The dependency-recomputation engine.
///
/// The engine owns the calc registry and all update state; it borrows
/// the store only for the duration of each call.
pub struct Engine {
    catalog: Arc<Catalog>,
    calcs: HashMap<String, CalcSpec>,
    dependents: HashMap<String, Vec<String>>,
    pending: VecDeque<WorkItem>,
    queued: HashSet<WorkItem>,
    memo: HashMap<(ObjectId, String, usize), u64>,
    generation: u64,
    lock_count: u32,
    autorun: bool,
    visited: Vec<(ObjectId, String)>,
}

impl Engine {
    /// Creates an engine with no registered calcs. Autorun starts on.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            calcs: HashMap::new(),
            dependents: HashMap::new(),
            pending: VecDeque::new(),
            queued: HashSet::new(),
            memo: HashMap::new(),
            generation: 0,
            lock_count: 0,
            autorun: true,
            visited: Vec::new(),
        }
    }

    /// Registers a calc for its output attribute.
    ///
    /// Inputs may be plain names or remote `#RD:` chains. A remote
    /// input depends on its final attribute wherever the chain lands,
    /// and on every hop pointer along the way, so both a value write
    /// and a pointer retarget requeue the output.
    ///
    /// # Errors
    /// Fails on an unknown output entry, a malformed remote input, or
    /// a duplicate registration.
    pub fn register(&mut self, spec: CalcSpec) -> Result<()> {
        if self.catalog.lookup(&spec.output).is_none() {
            return Err(Error::not_found(format!(
                "no catalog parameter named '{}'",
                spec.output
            )));
        }
        let key = spec.output.to_ascii_lowercase();
        if self.calcs.contains_key(&key) {
            return Err(Error::invalid_argument(format!(
                "attr '{}' already has a calc",
                spec.output
            )));
        }
        let mut input_keys = Vec::with_capacity(spec.inputs.len());
        for input in &spec.inputs {
            match RemotePath::parse(input)? {
                Some(remote) => {
                    for hop in &remote.hops {
                        input_keys.push(hop.to_ascii_lowercase());
                    }
                    input_keys.push(remote.attr.to_ascii_lowercase());
                }
                None => input_keys.push(input.to_ascii_lowercase()),
            }
        }
        for input_key in input_keys {
            self.dependents
                .entry(input_key)
                .or_default()
                .push(spec.output.clone());
        }
        debug!(output = %spec.output, inputs = spec.inputs.len(), "calc registered");
        self.calcs.insert(key, spec);
        Ok(())
    }

    /// True if a calc is registered for `attr`.
    #[must_use]
    pub fn is_derived(&self, attr: &str) -> bool {
        self.calcs.contains_key(&attr.to_ascii_lowercase())
    }

    // ----- lock discipline ----------------------------------------

    /// Takes the update lock; returns the new nesting depth.
    pub fn lock_update(&mut self) -> u32 {
        self.lock_count += 1;
        self.lock_count
    }

    /// Releases one level of the update lock; returns the remaining
    /// depth.
    ///
    /// # Errors
    /// Fails when the lock is not held.
    pub fn unlock_update(&mut self) -> Result<u32> {
        if self.lock_count == 0 {
            return Err(Error::invalid_state("update lock is not held"));
        }
        self.lock_count -= 1;
        Ok(self.lock_count)
    }

    /// True while the update lock is held.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_count > 0
    }

    /// Takes the update lock for a lexical scope.
    pub fn lock_scope(&mut self) -> UpdateGuard<'_> {
        self.lock_update();
        UpdateGuard { engine: self }
    }

    /// Sets whether external writes drain the queue immediately.
    /// Returns the previous setting.
    pub fn set_autorun(&mut self, autorun: bool) -> bool {
        std::mem::replace(&mut self.autorun, autorun)
    }

    /// Whether external writes drain the queue immediately.
    #[must_use]
    pub fn autorun(&self) -> bool {
        self.autorun
    }

    /// Number of queued work items.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of memoized cell results.
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    // ----- change notification and draining -----------------------

    /// Records an external write, invalidating memoized results and
    /// enqueuing dependents of `attr`. An output restricted to
    /// particular object types requeues on every open object of those
    /// types, since the write may sit behind another object's pointer
    /// chain. Under autorun and no lock, the queue drains immediately.
    ///
    /// # Errors
    /// Fails on a stale handle or a failing calc during autorun.
    pub fn note_external_write(
        &mut self,
        store: &mut ObjectStore,
        id: ObjectId,
        attr: &str,
    ) -> Result<()> {
        self.generation += 1;
        store.get(id)?;
        let outputs = self
            .dependents
            .get(&attr.to_ascii_lowercase())
            .cloned()
            .unwrap_or_default();
        for output in outputs {
            let Some(entry) = self.catalog.lookup(&output).cloned() else {
                continue;
            };
            if entry.valid_objects.is_empty() {
                self.enqueue(id, &output);
                continue;
            }
            for target in store.open_ids() {
                if entry.is_valid_object(store.get(target)?.object_type()) {
                    self.enqueue(target, &output);
                }
            }
        }
        if self.autorun && self.lock_count == 0 {
            self.drain(store)?;
        }
        Ok(())
    }

    fn enqueue(&mut self, object: ObjectId, attr: &str) {
        let item = WorkItem {
            object,
            attr: attr.to_string(),
        };
        if self.queued.insert(item.clone()) {
            trace!(object = %item.object, attr = %item.attr, "work enqueued");
            self.pending.push_back(item);
        }
    }

    /// Drains the pending queue unless the update lock is held.
    /// Returns false without running when locked.
    ///
    /// # Errors
    /// Fails when a calc fails; remaining work stays queued.
    pub fn run(&mut self, store: &mut ObjectStore) -> Result<bool> {
        if self.lock_count > 0 {
            return Ok(false);
        }
        self.drain(store)?;
        Ok(true)
    }

    /// Drains the pending queue regardless of autorun, which is
    /// forced on for the duration and restored afterwards. Safe to
    /// call repeatedly; an empty queue is a no-op.
    ///
    /// # Errors
    /// Fails when a calc fails; remaining work stays queued.
    pub fn finish_updates(&mut self, store: &mut ObjectStore) -> Result<()> {
        let saved = self.autorun;
        self.autorun = true;
        let result = self.drain(store);
        self.autorun = saved;
        result
    }

    fn drain(&mut self, store: &mut ObjectStore) -> Result<()> {
        // Memo entries for objects that have since closed are dead;
        // drop them before their slots get reused.
        self.memo.retain(|(id, _, _), _| store.get(*id).is_ok());
        while let Some(item) = self.pending.pop_front() {
            self.queued.remove(&item);
            // The object may have closed since the write was noted
            if store.get(item.object).is_err() {
                continue;
            }
            let size = store.attr_size(item.object, &item.attr)?;
            for index in 0..size {
                self.evaluate(store, item.object, &item.attr, index)?;
            }
        }
        Ok(())
    }

    // ----- evaluation ---------------------------------------------

    /// Evaluates one cell, recomputing it if it is derived and not
    /// memoized for the current generation. Plain attributes read
    /// straight through; a remote `#RD:` name evaluates at the end of
    /// its pointer chain, so a derived attribute stays derived when
    /// reached remotely.
    ///
    /// # Errors
    /// Fails on resolution errors, failing calcs, or cycles.
    pub fn evaluate(
        &mut self,
        store: &mut ObjectStore,
        id: ObjectId,
        attr: &str,
        index: usize,
    ) -> Result<Value> {
        if RemotePath::parse(attr)?.is_some() {
            let addr = store.resolve_attr(id, attr)?;
            return self.evaluate(store, addr.object, &addr.attr, index);
        }
        let key = attr.to_ascii_lowercase();
        let spec = match self.calcs.get(&key) {
            Some(spec) => spec,
            None => return store.cell(id, attr, index),
        };
        let memo_key = (id, key.clone(), index);
        if self.memo.get(&memo_key) == Some(&self.generation) {
            return store.cell(id, attr, index);
        }
        if self.visited.iter().any(|(o, a)| *o == id && *a == key) {
            let chain: Vec<&str> = self
                .visited
                .iter()
                .map(|(_, a)| a.as_str())
                .chain(std::iter::once(key.as_str()))
                .collect();
            return Err(Error::cycle(chain.join(" -> ")));
        }
        if self.visited.len() >= MAX_DEPTH {
            return Err(Error::cycle(format!(
                "evaluation depth exceeded {MAX_DEPTH} at '{attr}'"
            )));
        }
        let func = Arc::clone(&spec.func);
        self.visited.push((id, key.clone()));
        let result = func(&mut CalcContext {
            engine: &mut *self,
            store: &mut *store,
            object: id,
            index,
        });
        self.visited.pop();
        let value = result.map_err(|e| e.with_context(format!("calc '{attr}'")))?;
        store.set_cell_internal(id, attr, index, value.clone())?;
        let generation = self.generation;
        self.memo.insert(memo_key, generation);
        trace!(object = %id, attr, index, "cell recomputed");
        Ok(value)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("calcs", &self.calcs.len())
            .field("pending", &self.pending.len())
            .field("lock_count", &self.lock_count)
            .field("autorun", &self.autorun)
            .finish_non_exhaustive()
    }
}

/// Holds the update lock for a lexical scope.
pub struct UpdateGuard<'a> {
    engine: &'a mut Engine,
}

impl Drop for UpdateGuard<'_> {
    fn drop(&mut self) {
        let _ = self.engine.unlock_update();
    }
}
