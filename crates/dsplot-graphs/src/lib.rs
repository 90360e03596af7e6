//! # dsplot Graphs
//!
//! Request schemas, graph preprocessing, layouts and JPEG chart rendering.
//!
//! Each plot kind has a [`PlotRenderer`] that validates its request, draws it
//! with plotters on an in-memory [`Canvas`] and encodes the result as JPEG.
//! [`PlotService`] runs renders on the blocking thread pool.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod bar;
pub mod canvas;
pub mod heatmap;
pub mod layout;
pub mod network;
pub mod points;
pub mod preprocess;
pub mod renderer;
pub mod service;
pub mod theme;
pub mod timeseries;
pub mod types;

pub use bar::BarRenderer;
pub use canvas::Canvas;
pub use heatmap::{HeatmapMatrix, HeatmapRenderer};
pub use layout::LayoutParams;
pub use network::{DiagramModel, GraphRenderer};
pub use points::PointsRenderer;
pub use preprocess::*;
pub use renderer::PlotRenderer;
pub use service::PlotService;
pub use theme::Theme;
pub use timeseries::TimeSeriesRenderer;
pub use types::*;
