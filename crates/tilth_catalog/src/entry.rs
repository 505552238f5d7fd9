//! Attribute entry definitions.
//!
//! A [`CatalogEntry`] describes one named parameter: its type, its
//! dimension axes, the units it may be read and written in, its legal
//! choice tokens, the object types it may appear on, and behavior
//! flags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Parameter type of a catalog entry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Boolean (`yes`/`no`/`true`/`false`/`0`/`1`/`NaN`).
    Bool,
    /// Simulation-relative date.
    Date,
    /// Floating point, unit-aware.
    Float,
    /// Signed integer.
    Int,
    /// One of a finite set of choice tokens.
    List,
    /// Pointer to another object, stored with the root table stripped.
    Pointer,
    /// Free text.
    Str,
    /// Nested sub-object (opaque to the value protocol).
    SubObject,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Float => "float",
            Self::Int => "int",
            Self::List => "list",
            Self::Pointer => "pointer",
            Self::Str => "string",
            Self::SubObject => "subobject",
        };
        write!(f, "{name}")
    }
}

/// Read interpretation of a value series.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub enum Variant {
    /// The value stored at an index (the catalog default).
    #[default]
    Interval,
    /// The running sum of values through the index (numeric only).
    Cumulative,
    /// Whatever variant the attribute currently carries.
    Template,
    /// The catalog-specified variant (always interval).
    Catalog,
}

/// A legal unit for an entry.
///
/// `factor` converts a value in this unit into the entry's base unit
/// (the first unit listed is the base and has factor 1.0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    /// Unit name, e.g. `"in"`, `"mm"`.
    pub name: String,
    /// Multiplier converting this unit to the base unit.
    pub factor: f64,
}

impl UnitDef {
    /// Creates a unit definition.
    #[must_use]
    pub fn new(name: impl Into<String>, factor: f64) -> Self {
        Self {
            name: name.into(),
            factor,
        }
    }
}

/// Behavior flags for a catalog entry.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFlags {
    /// The attribute's dimension may not be resized.
    pub no_resize: bool,
    /// External writes are rejected (computed or fixed data).
    pub no_user_edit: bool,
    /// Float storage constrained to integral values.
    pub integral_float: bool,
    /// `#ENTRY_CUSTOM` is a legal pointer value.
    pub allow_custom: bool,
    /// `#ENTRY_NONE` is a legal pointer value.
    pub allow_none: bool,
    /// `#ENTRY_NULL` is a legal pointer value.
    pub allow_null: bool,
}

/// Schema definition for one named parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Internal parameter name, e.g. `"CLAY"`.
    pub name: String,
    /// Parameter type.
    pub param_type: ParamType,
    /// Dimension axis labels (0, 1, or 2 real axes).
    ///
    /// A label of `"1"` or `""` is not a real axis and is filtered out
    /// when the entry is built.
    #[serde(default)]
    pub axes: Vec<String>,
    /// Legal units; the first is the catalog/base unit.
    #[serde(default)]
    pub units: Vec<UnitDef>,
    /// Choice tokens for list entries.
    #[serde(default)]
    pub choices: Vec<String>,
    /// Object type names this entry may appear on.
    #[serde(default)]
    pub valid_objects: Vec<String>,
    /// For pointer entries: the root table stripped from stored paths.
    #[serde(default)]
    pub root_table: Option<String>,
    /// Behavior flags.
    #[serde(default)]
    pub flags: EntryFlags,
    /// Default raw value applied to new cells.
    #[serde(default)]
    pub default: Option<String>,
}

impl CatalogEntry {
    /// Creates an entry with the given name and type.
    #[must_use]
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            axes: Vec::new(),
            units: Vec::new(),
            choices: Vec::new(),
            valid_objects: Vec::new(),
            root_table: None,
            flags: EntryFlags::default(),
            default: None,
        }
    }

    /// Adds a dimension axis label; `"1"` and `""` are ignored.
    #[must_use]
    pub fn with_axis(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        if !label.is_empty() && label != "1" {
            self.axes.push(label);
        }
        self
    }

    /// Adds a legal unit. The first added unit is the base unit.
    #[must_use]
    pub fn with_unit(mut self, name: impl Into<String>, factor: f64) -> Self {
        self.units.push(UnitDef::new(name, factor));
        self
    }

    /// Adds a list choice token.
    #[must_use]
    pub fn with_choice(mut self, token: impl Into<String>) -> Self {
        self.choices.push(token.into());
        self
    }

    /// Adds a valid object type name.
    #[must_use]
    pub fn with_object(mut self, object_type: impl Into<String>) -> Self {
        self.valid_objects.push(object_type.into());
        self
    }

    /// Sets the pointer root table.
    #[must_use]
    pub fn with_root_table(mut self, table: impl Into<String>) -> Self {
        self.root_table = Some(table.into());
        self
    }

    /// Sets the behavior flags.
    #[must_use]
    pub fn with_flags(mut self, flags: EntryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the default raw value.
    #[must_use]
    pub fn with_default(mut self, raw: impl Into<String>) -> Self {
        self.default = Some(raw.into());
        self
    }

    /// Number of real dimension axes (0, 1, or 2).
    #[must_use]
    pub fn dim_count(&self) -> usize {
        self.axes.len()
    }

    /// True if this entry may appear on the named object type.
    #[must_use]
    pub fn is_valid_object(&self, object_type: &str) -> bool {
        self.valid_objects
            .iter()
            .any(|t| t.eq_ignore_ascii_case(object_type))
    }

    /// The base (catalog) unit name, if the entry carries units.
    #[must_use]
    pub fn base_unit(&self) -> Option<&str> {
        self.units.first().map(|u| u.name.as_str())
    }

    /// Looks up the to-base conversion factor for a unit name.
    #[must_use]
    pub fn unit_factor(&self, unit: &str) -> Option<f64> {
        self.units
            .iter()
            .find(|u| u.name.eq_ignore_ascii_case(unit))
            .map(|u| u.factor)
    }

    /// True if `unit` is legal for this entry.
    ///
    /// The empty token and `#U_TEMPLATE` always validate; they resolve
    /// to the attribute's current unit at read/write time. An entry
    /// with no units accepts only those tokens.
    #[must_use]
    pub fn is_valid_unit(&self, unit: &str) -> bool {
        unit.is_empty()
            || unit.eq_ignore_ascii_case("#U_TEMPLATE")
            || self.unit_factor(unit).is_some()
    }
}
