//! Typed cell values for attribute data.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::date::SimDate;
use crate::path::ObjectPath;

/// A single attribute cell value.
///
/// `Nil` represents a missing value (`NaN` in the string protocol for
/// numeric types, `""` for strings and pointers). Floats compare by
/// bit pattern so `Nil`-free NaN payloads stay `Eq`-consistent.
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Missing / unset.
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point, stored in the entry's base unit.
    Float(f64),
    /// Simulation-relative date.
    Date(SimDate),
    /// String value, also used for list choice tokens.
    Str(Arc<str>),
    /// Pointer to another object.
    Ref(PointerValue),
}

/// The value of a pointer-typed attribute.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointerValue {
    /// A concrete object path (full form, table prefix included).
    Path(ObjectPath),
    /// A sentinel entry selection instead of a stored record.
    Sentinel(EntrySentinel),
}

/// Sentinel entry selections for pointer values and open names.
///
/// These select a default/empty/unset/custom instance instead of a
/// stored record. `None`, `Null` and `Custom` are gated per attribute
/// by catalog flags; `Default` and `Model` are always legal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntrySentinel {
    /// Use the template's default record.
    Default,
    /// Use the model's hard-coded default.
    Model,
    /// An empty value chosen by the user (distinct from unset).
    None,
    /// Unset (distinct from NaN).
    Null,
    /// User-modified data diverging from a previous choice.
    Custom,
}

impl EntrySentinel {
    /// Parses a `#ENTRY_*` token, case-insensitively.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        let t = token.to_ascii_uppercase();
        match t.as_str() {
            "#ENTRY_DEFAULT" => Some(Self::Default),
            "#ENTRY_MODEL" => Some(Self::Model),
            "#ENTRY_NONE" => Some(Self::None),
            "#ENTRY_NULL" => Some(Self::Null),
            "#ENTRY_CUSTOM" => Some(Self::Custom),
            _ => None,
        }
    }

    /// The canonical token form.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Default => "#ENTRY_DEFAULT",
            Self::Model => "#ENTRY_MODEL",
            Self::None => "#ENTRY_NONE",
            Self::Null => "#ENTRY_NULL",
            Self::Custom => "#ENTRY_CUSTOM",
        }
    }
}

impl Value {
    /// Returns true if this value is missing.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Attempts to extract a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a number as f64 (converts int to float).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a date.
    #[must_use]
    pub const fn as_date(&self) -> Option<SimDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Attempts to extract a pointer value.
    #[must_use]
    pub const fn as_ref_value(&self) -> Option<&PointerValue> {
        match self {
            Self::Ref(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Bit equality keeps Eq reflexive for NaN payloads
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Nil => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::Date(d) => d.hash(state),
            Self::Str(s) => s.hash(state),
            Self::Ref(p) => p.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Ref(PointerValue::Path(p)) => write!(f, "->{p}"),
            Self::Ref(PointerValue::Sentinel(s)) => write!(f, "->{}", s.token()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s.into())
    }
}

impl From<SimDate> for Value {
    fn from(d: SimDate) -> Self {
        Self::Date(d)
    }
}
