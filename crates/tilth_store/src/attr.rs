//! Attribute instances: dimensioned cell arrays owned by one object.

use std::sync::Arc;

use tilth_catalog::{CatalogEntry, Variant};
use tilth_foundation::{Error, Result, Value};

/// A dimensioned, unit-aware attribute value cell array.
///
/// An instance is owned exclusively by one [`crate::FileObject`].
/// Cells are stored flat in row-major order; per-axis sizes mirror the
/// owning object's dimension state for this entry's axes.
#[derive(Clone, Debug)]
pub struct AttrInstance {
    entry: Arc<CatalogEntry>,
    sizes: Vec<usize>,
    cells: Vec<Value>,
    cursor: usize,
    variant: Variant,
    unit: Option<String>,
    computed: bool,
}

impl AttrInstance {
    /// Creates an instance with the given per-axis sizes, filled with
    /// the supplied default value.
    #[must_use]
    pub fn new(entry: Arc<CatalogEntry>, sizes: &[usize], fill: &Value) -> Self {
        debug_assert_eq!(sizes.len(), entry.dim_count());
        let total = Self::total(sizes);
        Self {
            entry,
            sizes: sizes.to_vec(),
            cells: vec![fill.clone(); total],
            cursor: 0,
            variant: Variant::Interval,
            unit: None,
            computed: false,
        }
    }

    fn total(sizes: &[usize]) -> usize {
        if sizes.is_empty() {
            1 // dimension count 0 means exactly one cell, always
        } else {
            sizes.iter().product()
        }
    }

    /// The catalog entry this instance was created from.
    #[must_use]
    pub fn entry(&self) -> &Arc<CatalogEntry> {
        &self.entry
    }

    /// Flat cell count (1 for a scalar, product of axis sizes otherwise).
    #[must_use]
    pub fn size(&self) -> usize {
        Self::total(&self.sizes)
    }

    /// Size along one axis.
    ///
    /// # Errors
    /// Returns an invalid-argument error for an axis the entry lacks.
    pub fn axis_size(&self, axis: usize) -> Result<usize> {
        self.sizes.get(axis).copied().ok_or_else(|| {
            Error::invalid_argument(format!(
                "attr '{}' has {} dimension(s), no axis {axis}",
                self.entry.name,
                self.sizes.len()
            ))
        })
    }

    /// The attribute's current cursor index.
    ///
    /// The cursor follows the most recent externally written index.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor, clamping to the current size.
    pub fn set_cursor(&mut self, index: usize) {
        self.cursor = index.min(self.size().saturating_sub(1));
    }

    /// The current read variant carried by this instance.
    #[must_use]
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Changes the carried read variant.
    pub fn set_variant(&mut self, variant: Variant) {
        self.variant = variant;
    }

    /// The current preferred unit (template unit), if set.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Sets the preferred unit.
    pub fn set_unit(&mut self, unit: Option<String>) {
        self.unit = unit;
    }

    /// True if the last write came from the recompute engine.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.computed
    }

    /// Reads a cell by flat index.
    ///
    /// # Errors
    /// Returns an invalid-argument error for an out-of-range index.
    pub fn cell(&self, index: usize) -> Result<&Value> {
        self.cells.get(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "index {index} out of range for attr '{}' (size {})",
                self.entry.name,
                self.cells.len()
            ))
        })
    }

    /// All cells, flat.
    #[must_use]
    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    /// Writes a cell, recording provenance. Returns true if the stored
    /// value changed.
    ///
    /// # Errors
    /// Returns an invalid-argument error for an out-of-range index.
    pub fn set_cell(&mut self, index: usize, value: Value, computed: bool) -> Result<bool> {
        let size = self.cells.len();
        let slot = self.cells.get_mut(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "index {index} out of range for attr '{}' (size {size})",
                self.entry.name,
            ))
        })?;
        let changed = *slot != value;
        *slot = value;
        self.computed = computed;
        if !computed {
            self.cursor = index;
        }
        Ok(changed)
    }

    /// Inserts one row along `axis` at `index`, filling new cells.
    ///
    /// # Errors
    /// Returns an error for a bad axis or an index past the axis end.
    pub fn insert_row(&mut self, axis: usize, index: usize, fill: &Value) -> Result<()> {
        let len = self.axis_size(axis)?;
        if index > len {
            return Err(Error::invalid_argument(format!(
                "insert index {index} past end of axis (size {len})"
            )));
        }
        let mut new_sizes = self.sizes.clone();
        new_sizes[axis] += 1;
        self.rebuild(&new_sizes, |coord| {
            if coord[axis] == index {
                None
            } else {
                let mut old = coord.to_vec();
                if old[axis] > index {
                    old[axis] -= 1;
                }
                Some(old)
            }
        }, fill);
        Ok(())
    }

    /// Removes one row along `axis` at `index`.
    ///
    /// # Errors
    /// Returns an error for a bad axis or an out-of-range index.
    pub fn remove_row(&mut self, axis: usize, index: usize) -> Result<()> {
        let len = self.axis_size(axis)?;
        if index >= len {
            return Err(Error::invalid_argument(format!(
                "delete index {index} out of range for axis (size {len})"
            )));
        }
        let mut new_sizes = self.sizes.clone();
        new_sizes[axis] -= 1;
        self.rebuild(&new_sizes, |coord| {
            let mut old = coord.to_vec();
            if old[axis] >= index {
                old[axis] += 1;
            }
            Some(old)
        }, &Value::Nil);
        self.cursor = self.cursor.min(self.size().saturating_sub(1));
        Ok(())
    }

    /// Rebuilds the flat cell array for `new_sizes`. `map` returns the
    /// old coordinate each new coordinate copies from, or `None` for a
    /// freshly inserted cell.
    fn rebuild<F>(&mut self, new_sizes: &[usize], map: F, fill: &Value)
    where
        F: Fn(&[usize]) -> Option<Vec<usize>>,
    {
        let old_sizes = std::mem::replace(&mut self.sizes, new_sizes.to_vec());
        let old_cells = std::mem::take(&mut self.cells);
        let total = Self::total(new_sizes);
        let mut cells = Vec::with_capacity(total);
        for flat in 0..total {
            let coord = Self::unflatten(flat, new_sizes);
            let value = match map(&coord) {
                Some(old_coord) => old_cells
                    .get(Self::flatten(&old_coord, &old_sizes))
                    .cloned()
                    .unwrap_or(Value::Nil),
                None => fill.clone(),
            };
            cells.push(value);
        }
        self.cells = cells;
    }

    fn flatten(coord: &[usize], sizes: &[usize]) -> usize {
        match sizes.len() {
            0 => 0,
            1 => coord[0],
            _ => coord[0] * sizes[1] + coord[1],
        }
    }

    fn unflatten(flat: usize, sizes: &[usize]) -> Vec<usize> {
        match sizes.len() {
            0 => Vec::new(),
            1 => vec![flat],
            _ => vec![flat / sizes[1], flat % sizes[1]],
        }
    }
}
