//! Test utilities and shared test helpers for dsplot.
//!
//! This module provides common testing utilities, fixtures, and helper functions
//! that can be used across all crates in the workspace for unit and integration testing.

use std::sync::Once;

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));

        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(filter)
            .try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Request payload fixtures shaped like the JSON bodies the service accepts.
pub mod payload_fixtures {
    /// Bar chart payload with three labelled values.
    pub fn bar_json() -> &'static str {
        r#"{"values": {"a": 5, "b": 1, "c": 9}, "asc": false, "title": "Counts"}"#
    }

    /// Graph payload with a duplicated edge and a chain.
    pub fn graph_json() -> &'static str {
        r#"{
            "edges": [
                {"first": "A", "second": "B", "weight": 3},
                {"first": "A", "second": "B", "weight": 2},
                {"first": "B", "second": "C", "weight": 5}
            ],
            "layout": "spring"
        }"#
    }

    /// Time series payload with two series.
    pub fn timeseries_json() -> &'static str {
        r#"{
            "values": {
                "alpha": {"2024-01-01T10:00:00": 1, "2024-01-01T11:00:00": 4},
                "beta": {"2024-01-01T10:30:00": 2}
            },
            "only_time": true
        }"#
    }

    /// Points payload with two color groups.
    pub fn points_json() -> &'static str {
        r#"{
            "points": [
                {"color": "RED", "lat": 55.7, "lon": 37.6},
                {"color": "BLUE", "lat": 59.9, "lon": 30.3},
                {"color": "RED", "lat": 56.8, "lon": 60.6}
            ]
        }"#
    }
}

/// Configuration-related test utilities.
pub mod config_fixtures {
    /// Create a minimal valid test configuration as YAML string.
    pub fn minimal_config_yaml() -> &'static str {
        r#"
server:
  host: "127.0.0.1"
  port: 8080
"#
    }

    /// Create a full test configuration as YAML string.
    pub fn full_config_yaml() -> &'static str {
        concat!(
            "server:\n",
            "  host: \"127.0.0.1\"\n",
            "  port: 9000\n",
            "  workers: 2\n",
            "  body_limit_bytes: 1048576\n",
            "\n",
            "render:\n",
            "  pixels_per_inch: 50\n",
            "  dpi: 150\n",
            "  jpeg_quality: 80\n",
            "  max_figsize_inches: 30\n",
            "  background: \"#fafafa\"\n",
            "  font_family: \"serif\"\n",
            "\n",
            "graph:\n",
            "  node_size_range: [500, 2500]\n",
            "  default_node_size: 1500\n",
            "  edge_width: 2\n",
            "  tier_colors: [\"#bfdbf7\", \"#053c5e\", \"#a31621\"]\n",
            "  spring_iterations: 100\n",
            "\n",
            "classifier:\n",
            "  model_path: \"models/anime.onnx\"\n",
            "  input_size: 224\n",
            "  mean: [0.0, 0.0, 0.0]\n",
            "  std: [1.0, 1.0, 1.0]\n",
            "\n",
            "logging:\n",
            "  level: \"debug\"\n",
            "  json_format: true\n"
        )
    }
}

/// Property-based testing utilities using proptest.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use proptest::prelude::*;

    /// Strategy for node names, including the reserved `:` separator.
    pub fn node_name_strategy() -> impl Strategy<Value = String> {
        r"[a-d:_]{1,4}".prop_map(|s| s.to_string())
    }

    /// Strategy for non-negative edge weights.
    pub fn weight_strategy() -> impl Strategy<Value = f64> {
        0.0f64..1000.0
    }

    /// Strategy for `(first, second, weight)` edge triples over a small name space.
    pub fn edge_triple_strategy() -> impl Strategy<Value = (String, String, f64)> {
        (node_name_strategy(), node_name_strategy(), weight_strategy())
    }
}
