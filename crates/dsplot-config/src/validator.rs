//! Runtime validation of loaded configuration.

use crate::schema::{ClassifierConfig, Config, GraphStyleConfig, RenderConfig, ServerConfig};
use dsplot_common::{DsError, Result};

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting every problem at once.
    pub fn validate(config: &Config) -> Result<()> {
        let mut problems = Vec::new();
        Self::check_server(&config.server, &mut problems);
        Self::check_render(&config.render, &mut problems);
        Self::check_graph(&config.graph, &mut problems);
        Self::check_classifier(&config.classifier, &mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(DsError::config(problems.join("; ")))
        }
    }

    fn check_server(server: &ServerConfig, problems: &mut Vec<String>) {
        if server.host.trim().is_empty() {
            problems.push("server.host cannot be empty".to_string());
        }
        if server.workers == 0 {
            problems.push("server.workers must be at least 1".to_string());
        }
        if server.body_limit_bytes == 0 {
            problems.push("server.body_limit_bytes must be at least 1".to_string());
        }
    }

    fn check_render(render: &RenderConfig, problems: &mut Vec<String>) {
        if !(10..=600).contains(&render.pixels_per_inch) {
            problems.push("render.pixels_per_inch must be between 10 and 600".to_string());
        }
        if render.dpi == 0 {
            problems.push("render.dpi must be at least 1".to_string());
        }
        if !(1..=100).contains(&render.jpeg_quality) {
            problems.push("render.jpeg_quality must be between 1 and 100".to_string());
        }
        if !(render.max_figsize_inches.is_finite() && render.max_figsize_inches > 0.0) {
            problems.push("render.max_figsize_inches must be a positive number".to_string());
        }
        if !is_hex_color(&render.background) {
            problems.push(format!(
                "render.background '{}' is not a #rrggbb color",
                render.background
            ));
        }
        if render.font_family.trim().is_empty() {
            problems.push("render.font_family cannot be empty".to_string());
        }
    }

    fn check_graph(graph: &GraphStyleConfig, problems: &mut Vec<String>) {
        let [start, end] = graph.node_size_range;
        if !(start.is_finite() && end.is_finite() && start > 0.0 && start <= end) {
            problems.push(
                "graph.node_size_range must be two positive numbers in ascending order".to_string(),
            );
        }
        if !(graph.default_node_size.is_finite() && graph.default_node_size > 0.0) {
            problems.push("graph.default_node_size must be a positive number".to_string());
        }
        if graph.edge_width == 0 {
            problems.push("graph.edge_width must be at least 1".to_string());
        }
        for color in &graph.tier_colors {
            if !is_hex_color(color) {
                problems.push(format!("graph.tier_colors entry '{color}' is not a #rrggbb color"));
            }
        }
    }

    fn check_classifier(classifier: &ClassifierConfig, problems: &mut Vec<String>) {
        if classifier.model_path.as_os_str().is_empty() {
            problems.push("classifier.model_path cannot be empty".to_string());
        }
        if classifier.input_size == 0 {
            problems.push("classifier.input_size must be at least 1".to_string());
        }
        if classifier.std.iter().any(|s| !s.is_finite() || *s == 0.0) {
            problems.push("classifier.std entries must be finite and non-zero".to_string());
        }
        if classifier.mean.iter().any(|m| !m.is_finite()) {
            problems.push("classifier.mean entries must be finite".to_string());
        }
    }
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate(self)
    }
}

/// Whether the string is a `#rrggbb` hex color.
pub fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = Config::default();
        config.render.jpeg_quality = 0;
        config.graph.node_size_range = [5000.0, 1000.0];
        config.classifier.std = [1.0, 0.0, 1.0];

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("jpeg_quality"));
        assert!(message.contains("node_size_range"));
        assert!(message.contains("classifier.std"));
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#a31621"));
        assert!(is_hex_color("#FFFFFF"));
        assert!(!is_hex_color("a31621"));
        assert!(!is_hex_color("#fff"));
        assert!(!is_hex_color("#zzzzzz"));
    }

    #[test]
    fn test_rejects_bad_tier_color() {
        let mut config = Config::default();
        config.graph.tier_colors[2] = "red".to_string();
        assert!(config.validate().is_err());
    }
}
