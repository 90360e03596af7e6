//! # dsplot Server
//!
//! HTTP front end for dsplot: JSON plot requests rendered to JPEG and an
//! image classification endpoint.
//!
//! Every response carries an `X-Process-Time` header with the handling time
//! in seconds.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use cli::Args;
pub use error::*;
pub use state::AppState;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use dsplot_common::format_elapsed;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Response header carrying the handling time in seconds.
pub const PROCESS_TIME_HEADER: &str = "x-process-time";

/// Builds the router with every endpoint and middleware.
pub fn app(state: AppState) -> Router {
    let plots = Router::new()
        .route("/points", post(handlers::points))
        .route("/histogram", post(handlers::histogram))
        .route("/timeseries", post(handlers::timeseries))
        .route("/graph", post(handlers::graph))
        .route("/graph-as-heatmap", post(handlers::graph_as_heatmap));

    let body_limit = state.body_limit_bytes;
    Router::new()
        .route("/health", get(handlers::health))
        .route("/anime/predict", post(handlers::predict))
        // first API version
        .route("/draw-points", post(handlers::points))
        .route("/draw-histogram", post(handlers::histogram))
        .nest("/plot", plots.clone())
        .merge(plots)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(process_time))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn process_time(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&format_elapsed(started.elapsed())) {
        response.headers_mut().insert(PROCESS_TIME_HEADER, value);
    }
    response
}

/// Serves the application until Ctrl-C or SIGTERM.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let bind_address = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("dsplot listening on {}", bind_address);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("dsplot stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received, draining connections");
}
