//! # dsplot Vision
//!
//! Image classification for the prediction endpoint: image decoding and
//! normalization into an NCHW tensor, and a pluggable inference backend with
//! an ONNX implementation built on tract.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod classifier;

pub use backend::*;
pub use classifier::*;
