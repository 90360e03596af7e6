//! Main entry point for dsplot.

use clap::Parser;
use dsplot_common::logging::init_logging;
use dsplot_server::{serve, AppState, Args};
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = args.load_config()?;

    let _guard = init_logging(&config.logging).map_err(|e| anyhow::anyhow!(e))?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        workers = config.server.workers,
        "Starting dsplot"
    );

    let state = AppState::from_config(&config).inspect_err(|e| {
        error!(
            path = %config.classifier.model_path.display(),
            "Failed to load classifier model: {}", e
        );
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()?;

    runtime.block_on(serve(state, &config.server.host, config.server.port))
}
