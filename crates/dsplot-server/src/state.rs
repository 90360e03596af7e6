//! Shared application state.

use dsplot_common::Result;
use dsplot_config::Config;
use dsplot_graphs::PlotService;
use dsplot_vision::{ImageClassifier, Predictor};
use std::sync::Arc;

/// State shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Chart renderer.
    pub plots: PlotService,
    /// Image classifier.
    pub classifier: Arc<dyn Predictor>,
    /// Largest accepted request body.
    pub body_limit_bytes: usize,
}

impl AppState {
    /// Assembles the state from its parts.
    pub fn new(plots: PlotService, classifier: Arc<dyn Predictor>, body_limit_bytes: usize) -> Self {
        Self {
            plots,
            classifier,
            body_limit_bytes,
        }
    }

    /// Builds the theme and loads the classifier model.
    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier = ImageClassifier::from_config(&config.classifier)?;
        Ok(Self::new(
            PlotService::from_config(config),
            Arc::new(classifier),
            config.server.body_limit_bytes,
        ))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("plots", &self.plots)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .finish_non_exhaustive()
    }
}
