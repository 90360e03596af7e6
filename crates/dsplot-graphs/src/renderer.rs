//! The renderer trait shared by every plot kind.

use crate::canvas::{Area, Canvas};
use crate::theme::Theme;
use crate::types::PlotOptions;
use dsplot_common::{PlotKind, Result};
use std::time::Instant;
use tracing::{debug, info};

/// Renders one kind of request into a JPEG image.
pub trait PlotRenderer {
    /// Request payload this renderer accepts.
    type Request;

    /// Plot kind, used in logs.
    fn kind(&self) -> PlotKind;

    /// Shared options of the request.
    fn options<'r>(&self, request: &'r Self::Request) -> &'r PlotOptions;

    /// Rejects payloads that cannot be drawn.
    fn validate(&self, request: &Self::Request, theme: &Theme) -> Result<()>;

    /// Draws the request on a background-filled canvas.
    fn draw(&self, root: &Area<'_>, request: &Self::Request, theme: &Theme) -> Result<()>;

    /// Validates, draws and encodes the request.
    fn render(&self, request: &Self::Request, theme: &Theme) -> Result<Vec<u8>> {
        let started = Instant::now();
        self.validate(request, theme)?;

        let figsize = self.options(request).figsize;
        let mut canvas = Canvas::new(figsize, theme.pixels_per_inch)?;
        debug!(kind = %self.kind(), %figsize, size = ?canvas.size(), "Allocated canvas");

        {
            let root = canvas.root();
            root.fill(&theme.background)?;
            self.draw(&root, request, theme)?;
            root.present()?;
        }

        let jpeg = canvas.encode_jpeg(theme.jpeg_quality, theme.dpi)?;
        info!(
            kind = %self.kind(),
            bytes = jpeg.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Rendered plot"
        );
        Ok(jpeg)
    }
}

/// Draws the optional title at the top of `root` and returns the area below it.
pub fn titled_area<'a>(root: &Area<'a>, options: &PlotOptions, theme: &Theme) -> Result<Area<'a>> {
    match options.title.as_deref() {
        Some(title) if !title.is_empty() => Ok(root.titled(title, theme.title_font())?),
        _ => Ok(root.clone()),
    }
}

/// Pixel margin around charts.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn chart_margin(theme: &Theme) -> u32 {
    theme.points_to_px(14.0).round() as u32
}

/// Height of an axis label area holding one line of tick labels and a description.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn label_area(theme: &Theme, lines: f64) -> u32 {
    theme.points_to_px(10.0 * 1.6 * lines).round() as u32
}

/// Index of the category slot a tick at `value` labels, when it sits on one.
///
/// Categorical axes place slot `i` at coordinate `i`; ticks between slots get no label.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn slot_index(value: f64, slots: usize) -> Option<usize> {
    let nearest = value.round();
    if (value - nearest).abs() > 1e-6 || nearest < 0.0 {
        return None;
    }
    let index = nearest as usize;
    (index < slots).then_some(index)
}
