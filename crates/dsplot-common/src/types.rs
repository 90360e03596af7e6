//! Common type definitions and newtype wrappers for domain modeling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Figure size in inches, serialized as a `[width, height]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigSize(pub f64, pub f64);

impl FigSize {
    /// Canvas size in pixels at the given resolution, at least one pixel per side.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_pixels(self, pixels_per_inch: u32) -> (u32, u32) {
        let ppi = f64::from(pixels_per_inch);
        (
            (self.0 * ppi).round().max(1.0) as u32,
            (self.1 * ppi).round().max(1.0) as u32,
        )
    }
}

impl Default for FigSize {
    fn default() -> Self {
        Self(20.0, 13.0)
    }
}

impl fmt::Display for FigSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}in", self.0, self.1)
    }
}

/// Image kind produced by a render, used for logging and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    /// Scatter map of colored points.
    Points,
    /// Bar chart of labelled values.
    Bar,
    /// Line chart of one or more time series.
    TimeSeries,
    /// Node-link diagram.
    Graph,
    /// Adjacency matrix heatmap.
    Heatmap,
}

impl PlotKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Bar => "bar",
            Self::TimeSeries => "timeseries",
            Self::Graph => "graph",
            Self::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
