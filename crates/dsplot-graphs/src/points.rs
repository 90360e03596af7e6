//! Scatter map of colored points.

use crate::canvas::Area;
use crate::renderer::{chart_margin, label_area, titled_area, PlotRenderer};
use crate::theme::{tag_color, Theme};
use crate::types::{PlotOptions, Point, PointsRequest};
use dsplot_common::{finite_bounds, PlotKind, Result};
use plotters::prelude::*;
use std::ops::Range;

/// Marker area of a point in square points.
const POINT_AREA: f64 = 10.0;

/// Points grouped by color tag, in first-seen tag order.
pub fn group_by_color(points: &[Point]) -> Vec<(&str, Vec<&Point>)> {
    let mut groups: Vec<(&str, Vec<&Point>)> = Vec::new();
    for point in points {
        match groups.iter_mut().find(|(tag, _)| *tag == point.color) {
            Some((_, members)) => members.push(point),
            None => groups.push((point.color.as_str(), vec![point])),
        }
    }
    groups
}

/// Axis range over `values` with 5% padding on each side.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let range = match finite_bounds(values) {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad)..(hi + pad)
        }
        Some((v, _)) => (v - 1.0)..(v + 1.0),
        None => 0.0..1.0,
    };
    finite_or_unit(range)
}

/// `range` when its span is finite and positive, else `0..1`.
pub fn finite_or_unit(range: Range<f64>) -> Range<f64> {
    let span = range.end - range.start;
    if span.is_finite() && span > 0.0 {
        range
    } else {
        0.0..1.0
    }
}

/// Renders [`PointsRequest`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsRenderer;

impl PlotRenderer for PointsRenderer {
    type Request = PointsRequest;

    fn kind(&self) -> PlotKind {
        PlotKind::Points
    }

    fn options<'r>(&self, request: &'r PointsRequest) -> &'r PlotOptions {
        &request.options
    }

    fn validate(&self, request: &PointsRequest, theme: &Theme) -> Result<()> {
        request.validate(theme.max_figsize_inches)
    }

    fn draw(&self, root: &Area<'_>, request: &PointsRequest, theme: &Theme) -> Result<()> {
        let area = titled_area(root, &request.options, theme)?;
        let x_range = padded_range(request.points.iter().map(|p| p.lon));
        let y_range = padded_range(request.points.iter().map(|p| p.lat));

        let mut chart = ChartBuilder::on(&area)
            .margin(chart_margin(theme))
            .x_label_area_size(label_area(theme, 2.0))
            .y_label_area_size(label_area(theme, 3.0))
            .build_cartesian_2d(x_range, y_range)?;

        let mut mesh = chart.configure_mesh();
        mesh.label_style(theme.label_font());
        if let Some(xlabel) = &request.options.xlabel {
            mesh.x_desc(xlabel.as_str());
        }
        if let Some(ylabel) = &request.options.ylabel {
            mesh.y_desc(ylabel.as_str());
        }
        mesh.draw()?;

        #[allow(clippy::cast_possible_truncation)]
        let radius = theme.marker_radius(POINT_AREA).max(2.0).round() as i32;

        for (index, (tag, members)) in group_by_color(&request.points).into_iter().enumerate() {
            let color = tag_color(tag, index);
            chart.draw_series(
                members
                    .into_iter()
                    .map(|p| Circle::new((p.lon, p.lat), radius, color.filled())),
            )?;
        }

        Ok(())
    }
}
