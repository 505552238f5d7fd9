//! End-to-end coverage of the session boundary.

mod common;

mod updates;
mod values;
