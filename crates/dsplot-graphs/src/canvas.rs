//! In-memory RGB canvas and JPEG encoding.

use dsplot_common::{DsError, FigSize, Result};
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::ColorType;
use plotters::coord::Shift;
use plotters::prelude::*;

/// Drawing area over a canvas buffer.
pub type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Largest canvas accepted, in pixels.
pub const MAX_CANVAS_PIXELS: u64 = 100_000_000;

/// An owned RGB pixel buffer that plotters draws into.
///
/// The buffer is released when the canvas is dropped, on every exit path.
#[derive(Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl Canvas {
    /// Allocates a canvas for `figsize` at `pixels_per_inch`.
    pub fn new(figsize: FigSize, pixels_per_inch: u32) -> Result<Self> {
        let (width, height) = figsize.to_pixels(pixels_per_inch);
        Self::with_pixels(width, height)
    }

    /// Allocates a canvas of the given pixel dimensions.
    pub fn with_pixels(width: u32, height: u32) -> Result<Self> {
        let pixels = u64::from(width) * u64::from(height);
        if pixels == 0 || pixels > MAX_CANVAS_PIXELS {
            return Err(DsError::validation_field(
                format!("canvas of {width}x{height} pixels is outside the supported size"),
                "figsize",
            ));
        }
        let len = usize::try_from(pixels * 3)
            .map_err(|e| DsError::render_with_source("Canvas too large for this platform", e))?;

        Ok(Self {
            width,
            height,
            buffer: vec![0; len],
        })
    }

    /// Canvas size in pixels.
    #[must_use]
    pub const fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw RGB bytes, row major.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.buffer
    }

    /// Drawing area covering the whole canvas.
    pub fn root(&mut self) -> Area<'_> {
        BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height)).into_drawing_area()
    }

    /// Encodes the canvas as JPEG with the given quality and pixel density.
    pub fn encode_jpeg(&self, quality: u8, dpi: u16) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.buffer.len() / 8);
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder.set_pixel_density(PixelDensity::dpi(dpi));
        encoder
            .encode(&self.buffer, self.width, self.height, ColorType::Rgb8)
            .map_err(|e| DsError::render_with_source("JPEG encoding failed", e))?;
        Ok(out)
    }
}
