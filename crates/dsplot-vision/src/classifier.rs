//! Image preprocessing and prediction.

use crate::backend::{ImageTensor, InferenceBackend, OnnxBackend};
use dsplot_common::{DsError, Result};
use dsplot_config::ClassifierConfig;
use image::imageops::FilterType;
use std::time::Instant;
use tracing::{debug, instrument};

/// Scores raw image bytes.
///
/// Object-safe so the HTTP layer can hold any classifier behind `Arc<dyn Predictor>`.
pub trait Predictor: Send + Sync {
    /// Decodes `bytes` and returns the model score.
    fn predict(&self, bytes: &[u8]) -> Result<f32>;
}

/// Classifier turning images into normalized tensors for an [`InferenceBackend`].
#[derive(Debug)]
pub struct ImageClassifier<B> {
    backend: B,
    side: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl ImageClassifier<OnnxBackend> {
    /// Loads the ONNX model named in the configuration.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let backend = OnnxBackend::load(&config.model_path, config.input_size as usize)?;
        Ok(Self::new(backend, config))
    }
}

impl<B: InferenceBackend> ImageClassifier<B> {
    /// Wraps a backend with the input size and normalization from `config`.
    pub fn new(backend: B, config: &ClassifierConfig) -> Self {
        Self {
            backend,
            side: config.input_size,
            mean: config.mean,
            std: config.std,
        }
    }

    /// Decodes, resizes and normalizes an image into an NCHW tensor.
    pub fn preprocess(&self, bytes: &[u8]) -> Result<ImageTensor> {
        let decoded = image::load_from_memory(bytes).map_err(|e| {
            DsError::validation_field(format!("image cannot be decoded: {e}"), "image")
        })?;

        let rgb = if decoded.width() == self.side && decoded.height() == self.side {
            decoded.to_rgb8()
        } else {
            decoded
                .resize_exact(self.side, self.side, FilterType::CatmullRom)
                .to_rgb8()
        };

        let side = self.side as usize;
        let plane = side * side;
        let mut data = vec![0.0_f32; 3 * plane];
        for (i, pixel) in rgb.pixels().enumerate() {
            for channel in 0..3 {
                let value = f32::from(pixel.0[channel]) / 255.0;
                data[channel * plane + i] = (value - self.mean[channel]) / self.std[channel];
            }
        }

        Ok(ImageTensor { side, data })
    }
}

impl<B: InferenceBackend> Predictor for ImageClassifier<B> {
    #[instrument(skip_all, fields(bytes = bytes.len()))]
    fn predict(&self, bytes: &[u8]) -> Result<f32> {
        let started = Instant::now();
        let tensor = self.preprocess(bytes)?;
        let score = self.backend.forward(tensor)?;
        debug!(
            score,
            elapsed_ms = started.elapsed().as_millis(),
            "Classified image"
        );
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockInferenceBackend;
    use dsplot_common::test_utils::assert_approx_eq;
    use image::{ImageOutputFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    fn config(side: u32) -> ClassifierConfig {
        ClassifierConfig {
            input_size: side,
            ..ClassifierConfig::default()
        }
    }

    #[test]
    fn test_preprocess_layout_and_scaling() {
        let classifier = ImageClassifier::new(MockInferenceBackend::new(), &config(2));
        let tensor = classifier
            .preprocess(&png(&RgbImage::from_pixel(2, 2, Rgb([255, 0, 51]))))
            .unwrap();

        assert_eq!(tensor.shape(), [1, 3, 2, 2]);
        assert_eq!(&tensor.data[0..4], &[1.0; 4]);
        assert_eq!(&tensor.data[4..8], &[0.0; 4]);
        assert_approx_eq(f64::from(tensor.data[8]), 0.2, 1e-6);
    }

    #[test]
    fn test_preprocess_resizes_and_normalizes() {
        let mut cfg = config(4);
        cfg.mean = [0.5, 0.5, 0.5];
        cfg.std = [0.5, 0.5, 0.5];
        let classifier = ImageClassifier::new(MockInferenceBackend::new(), &cfg);
        let tensor = classifier
            .preprocess(&png(&RgbImage::from_pixel(10, 6, Rgb([0, 0, 0]))))
            .unwrap();

        assert_eq!(tensor.side, 4);
        assert_eq!(tensor.data.len(), 48);
        assert!(tensor.data.iter().all(|v| (v + 1.0).abs() < 1e-6));
    }

    #[test]
    fn test_undecodable_image_is_client_error() {
        let classifier = ImageClassifier::new(MockInferenceBackend::new(), &config(4));
        let err = classifier.predict(b"plain text").unwrap_err();
        assert!(err.is_client_error());
        assert_eq!(err.field(), Some("image"));
    }

    #[test]
    fn test_black_image_scores_identically() {
        let mut backend = MockInferenceBackend::new();
        backend
            .expect_forward()
            .withf(|input| input.side == 8 && input.data.iter().all(|v| *v == 0.0))
            .times(2)
            .returning(|input| Ok(input.data.iter().sum::<f32>() + 0.25));

        let classifier = ImageClassifier::new(backend, &config(8));
        let black = png(&RgbImage::new(8, 8));
        let first = classifier.predict(&black).unwrap();
        let second = classifier.predict(&black).unwrap();
        assert_eq!(first, second);
        assert_approx_eq(f64::from(first), 0.25, 1e-6);
    }

    #[test]
    fn test_backend_errors_propagate() {
        let mut backend = MockInferenceBackend::new();
        backend
            .expect_forward()
            .returning(|_| Err(DsError::inference("boom")));
        let classifier = ImageClassifier::new(backend, &config(2));
        let err = classifier.predict(&png(&RgbImage::new(2, 2))).unwrap_err();
        assert!(!err.is_client_error());
    }
}
