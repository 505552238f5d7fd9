//! Error types for the Tilth system.
//!
//! Uses `thiserror` for ergonomic error definition. The public session
//! boundary never surfaces these directly; it converts them into
//! sentinel returns plus a last-error string.

use thiserror::Error;

/// Convenient result alias used throughout Tilth.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Tilth operations.
#[derive(Debug, Error)]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context naming the operation that failed.
    pub context: Option<String>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ctx) = &self.context {
            write!(f, "{ctx}: {}", self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds an operation name to this error.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    /// Creates an invalid-state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState(message.into()))
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(message.into()))
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation(message.into()))
    }

    /// Creates a size-limit error.
    #[must_use]
    pub fn size_limit(size: usize, limit: usize) -> Self {
        Self::new(ErrorKind::SizeLimit { size, limit })
    }

    /// Creates a dependency-cycle error.
    #[must_use]
    pub fn cycle(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cycle(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A required argument was null, empty, negative, or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The call is illegal in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A catalog name, object type, or persisted record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A value failed parsing or a unit/choice check for its declared type.
    #[error("validation failure: {0}")]
    Validation(String),

    /// A size exceeds the narrow accessor range.
    #[error("size {size} exceeds accessor limit {limit}; use the extended accessor")]
    SizeLimit {
        /// The actual size encountered.
        size: usize,
        /// The narrow accessor's maximum.
        limit: usize,
    },

    /// A dependency cycle was detected during recomputation.
    #[error("dependency cycle detected: {0}")]
    Cycle(String),

    /// Unexpected internal fault (caught at the boundary, never propagated).
    #[error("internal error: {0}")]
    Internal(String),
}
