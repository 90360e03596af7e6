//! Default values for every configuration section.

use crate::schema::*;
use std::path::PathBuf;

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            render: RenderConfig::default(),
            graph: GraphStyleConfig::default(),
            classifier: ClassifierConfig::default(),
            logging: dsplot_common::logging::LoggingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            workers: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixels_per_inch: 100,
            dpi: 300,
            jpeg_quality: 90,
            max_figsize_inches: 40.0,
            background: "#ffffff".to_string(),
            font_family: "sans-serif".to_string(),
        }
    }
}

impl Default for GraphStyleConfig {
    fn default() -> Self {
        Self {
            node_size_range: [1000.0, 5000.0],
            default_node_size: 3000.0,
            edge_width: 3,
            tier_colors: [
                "#bfdbf7".to_string(), // light blue
                "#053c5e".to_string(), // dark blue
                "#a31621".to_string(), // red
            ],
            spring_iterations: 300,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("weights.onnx"),
            input_size: 224,
            mean: [0.0, 0.0, 0.0],
            std: [1.0, 1.0, 1.0],
        }
    }
}
