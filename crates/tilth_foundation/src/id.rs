//! Object handles with generational indices.

use std::fmt;

/// Handle to an open object, with a generational index for stale
/// reference detection.
///
/// The generation increments when an arena slot is reused after the
/// object it held is released, so a handle kept past a close is
/// detected rather than silently resolving to a different object.
/// Cross-references between objects are always handle lookups, never
/// ownership, which makes pointer cycles harmless.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId {
    /// Index into the object arena.
    pub index: u32,
    /// Generation counter for stale reference detection.
    pub generation: u32,
}

impl ObjectId {
    /// Creates a new handle with the given index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the sentinel value representing "no object".
    #[must_use]
    pub const fn null() -> Self {
        Self {
            index: u32::MAX,
            generation: 0,
        }
    }

    /// Returns true if this is the null sentinel value.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "ObjectId(null)")
        } else {
            write!(f, "ObjectId({}v{})", self.index, self.generation)
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Object(null)")
        } else {
            write!(f, "Object({})", self.index)
        }
    }
}
