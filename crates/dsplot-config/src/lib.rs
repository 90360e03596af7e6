//! # dsplot Config
//!
//! Type-safe configuration management for dsplot.
//!
//! This crate provides the configuration schema with defaults, loading from
//! YAML or TOML files with `DSPLOT_*` environment overrides, and validation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::*;
pub use schema::*;
pub use validator::*;
