//! Remote attribute paths.
//!
//! A remote path addresses an attribute on another object by chasing
//! one or more pointer attributes: `#RD:CLIMATE_PTR:EI_10YEAR` means
//! "follow `CLIMATE_PTR` on this object, then read `EI_10YEAR` on the
//! object it points to". Hops may chain: `#RD:A:B:C` follows pointers
//! `A` then `B` before resolving attribute `C`.
//!
//! The string form is parsed once into this typed value; resolution is
//! an iterative traversal over the hops, never ad hoc string scanning.

use crate::error::Error;

/// Prefix selecting the remote form of an attribute name.
pub const REMOTE_PREFIX: &str = "#RD:";

/// A parsed remote attribute path: pointer hops plus the target name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemotePath {
    /// Pointer attribute names to follow, in order.
    pub hops: Vec<String>,
    /// The attribute name resolved on the final object.
    pub attr: String,
}

impl RemotePath {
    /// Returns the parsed remote path if `name` uses the `#RD:` form,
    /// `None` if it is a plain short name.
    ///
    /// # Errors
    /// Returns an invalid-argument error for a malformed remote path
    /// (missing hops or empty segments).
    pub fn parse(name: &str) -> crate::Result<Option<Self>> {
        if name.len() < REMOTE_PREFIX.len()
            || !name[..REMOTE_PREFIX.len()].eq_ignore_ascii_case(REMOTE_PREFIX)
        {
            return Ok(None);
        }
        let body = &name[REMOTE_PREFIX.len()..];
        let segments: Vec<&str> = body.split(':').collect();
        if segments.len() < 2 {
            return Err(Error::invalid_argument(format!(
                "remote path '{name}' needs at least one pointer hop and a target"
            )));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::invalid_argument(format!(
                "remote path '{name}' has an empty segment"
            )));
        }
        let attr = segments[segments.len() - 1].to_string();
        let hops = segments[..segments.len() - 1]
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok(Some(Self { hops, attr }))
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#RD:{}:{}", self.hops.join(":"), self.attr)
    }
}
