//! # dsplot Common
//!
//! Shared error type, value types, formatting helpers and logging bootstrap
//! for dsplot.
//!
//! This crate provides the foundational types and utilities used across
//! all other crates in the dsplot workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::*;
pub use types::*;
pub use utils::*;
