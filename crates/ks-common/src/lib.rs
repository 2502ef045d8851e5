//! Shared vocabulary for the K# toolchain crates.
//!
//! Every fallible operation in the compiler reports an [`Error`] built from
//! a crate-specific [`ErrorCode`] plus an optional [`Location`]. Phases that
//! prefer reporting everything over failing fast return a [`PartialResult`].

pub mod error;
pub mod location;
pub mod partial;

pub use error::{Error, ErrorCode};
pub use location::{LineIndex, Location, Position};
pub use partial::PartialResult;
