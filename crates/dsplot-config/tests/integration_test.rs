//! Integration tests for configuration loading.

use dsplot_common::test_utils::config_fixtures;
use dsplot_config::{Config, ConfigError, ConfigLoader};
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_minimal_yaml_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "config.yaml", config_fixtures::minimal_config_yaml());

    let config = ConfigLoader::read_file(&path).unwrap();
    let defaults = Config::default();

    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.render, defaults.render);
    assert_eq!(config.graph, defaults.graph);
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_yaml_reads_every_section() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "config.yml", config_fixtures::full_config_yaml());

    let config = ConfigLoader::read_file(&path).unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.workers, 2);
    assert_eq!(config.server.body_limit_bytes, 1_048_576);
    assert_eq!(config.render.pixels_per_inch, 50);
    assert_eq!(config.render.dpi, 150);
    assert_eq!(config.render.jpeg_quality, 80);
    assert_eq!(config.render.background, "#fafafa");
    assert_eq!(config.graph.node_size_range, [500.0, 2500.0]);
    assert_eq!(config.graph.spring_iterations, 100);
    assert_eq!(
        config.classifier.model_path,
        PathBuf::from("models/anime.onnx")
    );
    assert_eq!(config.logging.level, "debug");
    assert!(config.logging.json_format);
}

#[test]
fn test_toml_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "config.toml",
        r##"
[server]
port = 8123

[render]
jpeg_quality = 70
background = "#000000"
"##,
    );

    let config = ConfigLoader::read_file(&path).unwrap();
    assert_eq!(config.server.port, 8123);
    assert_eq!(config.render.jpeg_quality, 70);
    assert_eq!(config.render.background, "#000000");
}

#[test]
fn test_invalid_values_fail_validation() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "bad.yaml",
        "render:\n  jpeg_quality: 0\n  background: \"white\"\n",
    );

    let config = ConfigLoader::read_file(&path).unwrap();
    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("jpeg_quality"));
    assert!(message.contains("background"));
}

#[test]
fn test_malformed_yaml() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "broken.yaml", "server: [unclosed\n");

    assert!(matches!(
        ConfigLoader::read_file(&path),
        Err(ConfigError::Yaml(_))
    ));
}

#[test]
fn test_overrides_after_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "config.yaml", config_fixtures::full_config_yaml());

    let mut config = ConfigLoader::read_file(&path).unwrap();
    ConfigLoader::apply_overrides(&mut config, |name| match name {
        "DSPLOT_PORT" => Some("7000".to_string()),
        "DSPLOT_JPEG_QUALITY" => Some("95".to_string()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.server.port, 7000);
    assert_eq!(config.render.jpeg_quality, 95);
    assert_eq!(config.server.workers, 2);
}
