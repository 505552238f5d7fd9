//! Case-insensitive object paths.
//!
//! Objects are identified by `table\path\name` strings, compared
//! case-insensitively. The first component is the root table (e.g.
//! `climates`), the last component is the record name, and anything
//! between is the folder path. Forward slashes are accepted on input
//! and normalized to backslashes.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::Error;

/// A case-insensitive `table\path\name` object identity.
///
/// The original spelling is preserved for display; equality and
/// hashing use the lowercased form.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectPath {
    full: Arc<str>,
    lower: Arc<str>,
}

impl ObjectPath {
    /// Parses a path, normalizing separators and trimming trailing ones.
    ///
    /// # Errors
    /// Returns an invalid-argument error for an empty path or one with
    /// an empty component.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        let normalized: String = raw.trim().replace('/', "\\");
        let trimmed = normalized.trim_end_matches('\\');
        if trimmed.is_empty() {
            return Err(Error::invalid_argument("empty object path"));
        }
        if trimmed.split('\\').any(str::is_empty) {
            return Err(Error::invalid_argument(format!(
                "object path '{raw}' has an empty component"
            )));
        }
        Ok(Self {
            full: Arc::from(trimmed),
            lower: Arc::from(trimmed.to_ascii_lowercase().as_str()),
        })
    }

    /// The full `table\path\name` string, original spelling.
    #[must_use]
    pub fn full(&self) -> &str {
        &self.full
    }

    /// The lowercased form used as a registry key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.lower
    }

    fn components(&self) -> Vec<&str> {
        self.full.split('\\').collect()
    }

    /// The root table component.
    #[must_use]
    pub fn table(&self) -> &str {
        self.full.split('\\').next().unwrap_or(&self.full)
    }

    /// The final name component.
    #[must_use]
    pub fn name(&self) -> &str {
        self.full.rsplit('\\').next().unwrap_or(&self.full)
    }

    /// The folder path between table and name (may be empty).
    #[must_use]
    pub fn folder(&self) -> String {
        let parts = self.components();
        if parts.len() <= 2 {
            String::new()
        } else {
            parts[1..parts.len() - 1].join("\\")
        }
    }

    /// Everything after the table: `path\name`.
    #[must_use]
    pub fn right(&self) -> String {
        let parts = self.components();
        if parts.len() <= 1 {
            String::new()
        } else {
            parts[1..].join("\\")
        }
    }

    /// Everything before the name: `table\path`.
    #[must_use]
    pub fn left(&self) -> String {
        let parts = self.components();
        if parts.len() <= 1 {
            String::new()
        } else {
            parts[..parts.len() - 1].join("\\")
        }
    }

    /// Table and name with the folder path elided: `table\name`.
    #[must_use]
    pub fn outer(&self) -> String {
        let parts = self.components();
        if parts.len() <= 1 {
            self.full.to_string()
        } else {
            format!("{}\\{}", parts[0], parts[parts.len() - 1])
        }
    }

    /// Returns this path without its root table prefix, if the prefix
    /// matches `table` case-insensitively.
    ///
    /// Pointer attribute values store paths in this stripped form; the
    /// catalog names the table to strip.
    #[must_use]
    pub fn strip_table(&self, table: &str) -> Option<String> {
        let parts = self.components();
        if parts.len() >= 2 && parts[0].eq_ignore_ascii_case(table) {
            Some(parts[1..].join("\\"))
        } else {
            None
        }
    }

    /// Joins a table prefix onto a stripped path string.
    ///
    /// # Errors
    /// Returns an error if the resulting path is malformed.
    pub fn with_table(table: &str, stripped: &str) -> crate::Result<Self> {
        Self::parse(&format!("{table}\\{stripped}"))
    }

    /// True if this path starts with `prefix` on a component boundary.
    #[must_use]
    pub fn starts_with(&self, prefix: &ObjectPath) -> bool {
        let p = prefix.lower.as_ref();
        self.lower.as_ref() == p
            || (self.lower.len() > p.len()
                && self.lower.starts_with(p)
                && self.lower.as_bytes()[p.len()] == b'\\')
    }

    /// Number of path components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.full.split('\\').count()
    }
}

impl PartialEq for ObjectPath {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower
    }
}

impl Eq for ObjectPath {}

impl Hash for ObjectPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower.hash(state);
    }
}

impl fmt::Debug for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectPath({})", self.full)
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full)
    }
}
