//! The public session boundary.
//!
//! A [`Session`] wraps the store and engine behind a flat,
//! sentinel-returning surface: failures never cross the boundary as
//! errors, they become `-1`/null returns plus a last-error string on
//! the session's [`ErrorChannel`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod errors;
mod session;

pub use errors::ErrorChannel;
pub use session::{Session, RX_FAILURE};
