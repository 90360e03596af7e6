//! Async facade running renders on the blocking thread pool.

use crate::bar::BarRenderer;
use crate::heatmap::HeatmapRenderer;
use crate::network::GraphRenderer;
use crate::points::PointsRenderer;
use crate::renderer::PlotRenderer;
use crate::theme::Theme;
use crate::timeseries::TimeSeriesRenderer;
use crate::types::{BarRequest, GraphRequest, PointsRequest, TimeSeriesRequest};
use dsplot_common::{DsError, Result};
use dsplot_config::Config;
use std::sync::Arc;
use tracing::instrument;

/// Renders every plot kind with one shared, immutable [`Theme`].
#[derive(Debug, Clone)]
pub struct PlotService {
    theme: Arc<Theme>,
}

impl PlotService {
    /// Creates the service.
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            theme: Arc::new(theme),
        }
    }

    /// Creates the service from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(Theme::from_config(config))
    }

    /// Shared theme.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Scatter map of colored points.
    #[instrument(skip_all, fields(points = request.points.len()))]
    pub async fn draw_points(&self, request: PointsRequest) -> Result<Vec<u8>> {
        self.run(PointsRenderer, request).await
    }

    /// Bar chart.
    #[instrument(skip_all, fields(bars = request.values.len()))]
    pub async fn draw_bar(&self, request: BarRequest) -> Result<Vec<u8>> {
        self.run(BarRenderer, request).await
    }

    /// Time series line chart.
    #[instrument(skip_all, fields(series = request.values.len()))]
    pub async fn draw_timeseries(&self, request: TimeSeriesRequest) -> Result<Vec<u8>> {
        self.run(TimeSeriesRenderer, request).await
    }

    /// Node-link diagram.
    #[instrument(skip_all, fields(edges = request.edges.len()))]
    pub async fn draw_graph(&self, request: GraphRequest) -> Result<Vec<u8>> {
        self.run(GraphRenderer, request).await
    }

    /// Adjacency heatmap.
    #[instrument(skip_all, fields(edges = request.edges.len()))]
    pub async fn draw_graph_as_heatmap(&self, request: GraphRequest) -> Result<Vec<u8>> {
        self.run(HeatmapRenderer, request).await
    }

    async fn run<R>(&self, renderer: R, request: R::Request) -> Result<Vec<u8>>
    where
        R: PlotRenderer + Send + 'static,
        R::Request: Send + 'static,
    {
        let theme = Arc::clone(&self.theme);
        tokio::task::spawn_blocking(move || renderer.render(&request, &theme))
            .await
            .map_err(|e| DsError::render_with_source("Render task failed", e))?
    }
}
