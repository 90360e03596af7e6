//! Command line arguments.

use clap::Parser;
use dsplot_config::{Config, ConfigError, ConfigLoader};
use std::path::PathBuf;

/// Chart rendering and image classification HTTP service.
#[derive(Debug, Parser)]
#[command(name = "dsplot", version, about)]
pub struct Args {
    /// Configuration file (YAML or TOML).
    #[arg(short, long, env = "DSPLOT_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Address to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Runtime worker threads.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log filter, e.g. `debug` or `dsplot_graphs=trace`.
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Overrides configuration values with the flags that were given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(workers) = self.workers {
            config.server.workers = workers;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }

    /// Loads the configuration file and environment, applies the flags, then validates.
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = ConfigLoader::load_unvalidated(self.config.as_deref())?;
        self.apply(&mut config);
        ConfigLoader::validated(config)
    }
}
