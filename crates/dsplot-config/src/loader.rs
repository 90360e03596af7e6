//! Configuration loading with environment variable overrides.

use crate::schema::Config;
use dsplot_common::DsError;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "DSPLOT_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        /// File that failed to load
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// File extension is neither YAML nor TOML
    #[error("Unsupported configuration format for '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParse {
        /// Variable name
        var: String,
        /// Parser message
        message: String,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

impl From<ConfigError> for DsError {
    fn from(err: ConfigError) -> Self {
        Self::config_with_source("Configuration loading error", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        Self::validated(Self::load_unvalidated(Some(path.as_ref()))?)
    }

    /// Load configuration from `DSPLOT_CONFIG_PATH`, `config.yaml` or `config.yml`,
    /// falling back to defaults, then apply environment overrides.
    pub fn load() -> Result<Config, ConfigError> {
        Self::validated(Self::load_unvalidated(None)?)
    }

    /// Load configuration from a specific file, or discover one when `path` is `None`
    pub fn load_from(path: Option<&Path>) -> Result<Config, ConfigError> {
        Self::validated(Self::load_unvalidated(path)?)
    }

    /// Like [`Self::load_from`], but leaves validation to the caller so that
    /// later overrides can still fix invalid values.
    pub fn load_unvalidated(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path.map(Path::to_path_buf).or_else(Self::discover) {
            Some(path) => Self::read_file(&path)?,
            None => {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        };
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(config_path));
        }
        ["config.yaml", "config.yml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists())
    }

    /// Parse a configuration file without overrides or validation
    pub fn read_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config = match extension.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        debug!("Parsed configuration file {}", path.display());
        Ok(config)
    }

    /// Apply process environment overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |name| env::var(name).ok())
    }

    /// Apply overrides looked up through `lookup`, keyed by `DSPLOT_*` variable names
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DSPLOT_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("DSPLOT_PORT") {
            config.server.port = parse_var("DSPLOT_PORT", &port)?;
        }

        if let Some(workers) = lookup("DSPLOT_WORKERS") {
            config.server.workers = parse_var("DSPLOT_WORKERS", &workers)?;
        }

        if let Some(model_path) = lookup("DSPLOT_MODEL_PATH") {
            config.classifier.model_path = PathBuf::from(model_path);
        }

        if let Some(level) = lookup("DSPLOT_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(json) = lookup("DSPLOT_LOG_JSON") {
            config.logging.json_format = parse_var("DSPLOT_LOG_JSON", &json)?;
        }

        if let Some(quality) = lookup("DSPLOT_JPEG_QUALITY") {
            config.render.jpeg_quality = parse_var("DSPLOT_JPEG_QUALITY", &quality)?;
        }

        if let Some(ppi) = lookup("DSPLOT_PIXELS_PER_INCH") {
            config.render.pixels_per_inch = parse_var("DSPLOT_PIXELS_PER_INCH", &ppi)?;
        }

        Ok(())
    }

    /// Validate a fully overridden configuration
    pub fn validated(config: Config) -> Result<Config, ConfigError> {
        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(config)
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvParse {
        var: var.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("DSPLOT_HOST", "127.0.0.1"),
            ("DSPLOT_PORT", "9100"),
            ("DSPLOT_WORKERS", "3"),
            ("DSPLOT_MODEL_PATH", "/models/anime.onnx"),
            ("DSPLOT_LOG_JSON", "true"),
        ]);

        ConfigLoader::apply_overrides(&mut config, lookup).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.workers, 3);
        assert_eq!(
            config.classifier.model_path,
            PathBuf::from("/models/anime.onnx")
        );
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_override_parse_error_names_variable() {
        let mut config = Config::default();
        let err = ConfigLoader::apply_overrides(&mut config, lookup_from(&[("DSPLOT_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("DSPLOT_PORT"));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "port = 1").unwrap();

        assert!(matches!(
            ConfigLoader::read_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::read_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        let converted: DsError = err.into();
        assert!(converted.to_string().contains("Configuration error"));
    }
}
