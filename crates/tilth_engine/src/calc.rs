//! Calc functions: derived-attribute specifications and their
//! evaluation context.

use std::fmt;
use std::sync::Arc;

use tilth_foundation::{ObjectId, Result, Value};
use tilth_store::ObjectStore;

use crate::engine::Engine;

/// A calc function body.
///
/// The function reads its declared inputs through the context and
/// returns the value of one output cell.
pub type CalcFn = Arc<dyn Fn(&mut CalcContext<'_>) -> Result<Value> + Send + Sync>;

/// Specification of one derived attribute.
#[derive(Clone)]
pub struct CalcSpec {
    /// The catalog entry this calc produces.
    pub output: String,
    /// Catalog entries the function reads. Writes to any of these
    /// enqueue the output for recomputation.
    pub inputs: Vec<String>,
    /// The function body.
    pub func: CalcFn,
}

impl CalcSpec {
    /// Creates a calc specification.
    pub fn new(
        output: impl Into<String>,
        inputs: impl IntoIterator<Item = impl Into<String>>,
        func: impl Fn(&mut CalcContext<'_>) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            output: output.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for CalcSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalcSpec")
            .field("output", &self.output)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

/// Evaluation context handed to a calc function.
///
/// Input reads go through the engine so that derived inputs are
/// recomputed first and cycles are detected.
pub struct CalcContext<'a> {
    pub(crate) engine: &'a mut Engine,
    pub(crate) store: &'a mut ObjectStore,
    pub(crate) object: ObjectId,
    pub(crate) index: usize,
}

impl CalcContext<'_> {
    /// The object being computed.
    #[must_use]
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// The cell index being computed.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Reads an input cell at the output's index.
    ///
    /// # Errors
    /// Fails on resolution errors or dependency cycles.
    pub fn input(&mut self, name: &str) -> Result<Value> {
        self.input_at(name, self.index)
    }

    /// Reads an input cell at an explicit index.
    ///
    /// # Errors
    /// Fails on resolution errors or dependency cycles.
    pub fn input_at(&mut self, name: &str, index: usize) -> Result<Value> {
        self.engine
            .evaluate(&mut *self.store, self.object, name, index)
    }

    /// Flat size of an input attribute.
    ///
    /// # Errors
    /// Fails on resolution errors.
    pub fn input_size(&mut self, name: &str) -> Result<usize> {
        self.store.attr_size(self.object, name)
    }
}
