//! Configuration schema definitions using serde.

use dsplot_common::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for dsplot.
///
/// Every section is optional in the file; missing sections and fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Canvas and image encoding configuration.
    pub render: RenderConfig,
    /// Graph diagram styling.
    pub graph: GraphStyleConfig,
    /// Image classifier configuration.
    pub classifier: ClassifierConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Number of runtime worker threads.
    pub workers: usize,
    /// Maximum accepted request body size in bytes.
    pub body_limit_bytes: usize,
}

/// Canvas and image encoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pixels per inch of figure size.
    pub pixels_per_inch: u32,
    /// Density written into the JPEG header.
    pub dpi: u16,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
    /// Largest accepted figure side in inches.
    pub max_figsize_inches: f64,
    /// Canvas background (`#rrggbb`).
    pub background: String,
    /// Font family for all text.
    pub font_family: String,
}

/// Graph diagram styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStyleConfig {
    /// Node marker area range `[smallest, largest]` in square points.
    pub node_size_range: [f64; 2],
    /// Node marker area when no per-node weights apply, in square points.
    pub default_node_size: f64,
    /// Edge stroke width in pixels.
    pub edge_width: u32,
    /// Edge colors for the low, middle and high weight tiers (`#rrggbb`).
    pub tier_colors: [String; 3],
    /// Steps of the force-directed simulation.
    pub spring_iterations: usize,
}

/// Image classifier configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Path of the ONNX model file.
    pub model_path: PathBuf,
    /// Side of the square model input in pixels.
    pub input_size: u32,
    /// Per-channel mean subtracted after scaling to `[0, 1]`.
    pub mean: [f32; 3],
    /// Per-channel standard deviation divided after mean subtraction.
    pub std: [f32; 3],
}
