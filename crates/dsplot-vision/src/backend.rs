//! Inference backends.

use dsplot_common::{DsError, Result};
use std::path::Path;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// Normalized image in NCHW layout with a batch of one.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    /// Side of the square image in pixels.
    pub side: usize,
    /// `3 * side * side` values, channel-major.
    pub data: Vec<f32>,
}

impl ImageTensor {
    /// Tensor shape `[1, 3, side, side]`.
    #[must_use]
    pub const fn shape(&self) -> [usize; 4] {
        [1, 3, self.side, self.side]
    }
}

/// Runs a forward pass of the classification model.
#[cfg_attr(test, mockall::automock)]
pub trait InferenceBackend: Send + Sync {
    /// Returns the first element of the model output.
    fn forward(&self, input: ImageTensor) -> Result<f32>;
}

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// ONNX model loaded once and optimized for a fixed input size.
pub struct OnnxBackend {
    plan: OnnxPlan,
    side: usize,
}

impl std::fmt::Debug for OnnxBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxBackend").field("side", &self.side).finish_non_exhaustive()
    }
}

impl OnnxBackend {
    /// Loads and optimizes the model at `path` for `[1, 3, side, side]` input.
    pub fn load(path: &Path, side: usize) -> Result<Self> {
        let started = Instant::now();
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(
                    0,
                    InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
                )
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                DsError::inference(format!(
                    "Failed to load model from {}: {e:#}",
                    path.display()
                ))
            })?;

        info!(
            path = %path.display(),
            side,
            elapsed_ms = started.elapsed().as_millis(),
            "Loaded ONNX model"
        );
        Ok(Self { plan, side })
    }
}

impl InferenceBackend for OnnxBackend {
    fn forward(&self, input: ImageTensor) -> Result<f32> {
        if input.side != self.side {
            return Err(DsError::inference(format!(
                "Model expects {0}x{0} input, got {1}x{1}",
                self.side, input.side
            )));
        }

        let tensor = tract_ndarray::Array4::from_shape_vec(
            (1, 3, input.side, input.side),
            input.data,
        )
        .map_err(|e| DsError::inference_with_source("Input tensor has the wrong size", e))?;

        let outputs = self
            .plan
            .run(tvec!(tensor.into_tensor().into()))
            .map_err(|e| DsError::inference(format!("Model execution failed: {e:#}")))?;

        let first = outputs
            .first()
            .ok_or_else(|| DsError::inference("Model produced no outputs"))?;
        let view = first
            .to_array_view::<f32>()
            .map_err(|e| DsError::inference(format!("Model output is not f32: {e:#}")))?;
        let score = view
            .iter()
            .next()
            .copied()
            .ok_or_else(|| DsError::inference("Model output is empty"))?;

        debug!(score, "Model forward pass");
        Ok(score)
    }
}
