//! Adjacency matrix heatmap of a weighted graph.

use crate::canvas::Area;
use crate::points::finite_or_unit;
use crate::preprocess::{aggregate_edges, sanitize_graph};
use crate::renderer::{chart_margin, label_area, slot_index, titled_area, PlotRenderer};
use crate::theme::{rocket_r, Theme};
use crate::types::{GraphRequest, PlotOptions};
use dsplot_common::{finite_bounds, truncate_label, PlotKind, Result};
use plotters::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

const MAX_LABEL_CHARS: usize = 24;
const COLORBAR_STEPS: usize = 128;

/// Directed adjacency matrix over the sorted node names.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapMatrix {
    /// Row and column labels, sorted.
    pub index: Vec<String>,
    /// Aggregated weight at `(row = first, col = second)`; absent cells are empty.
    pub cells: BTreeMap<(usize, usize), f64>,
}

impl HeatmapMatrix {
    /// Sanitizes and aggregates the request edges into a matrix.
    pub fn from_request(request: &GraphRequest) -> Self {
        let mut request = request.clone();
        sanitize_graph(&mut request);
        let edges = aggregate_edges(&request.edges);

        let names: BTreeSet<&str> = edges
            .iter()
            .flat_map(|e| [e.first.as_str(), e.second.as_str()])
            .collect();
        let index: Vec<String> = names.into_iter().map(str::to_string).collect();
        let position = |name: &str| index.binary_search_by(|entry| entry.as_str().cmp(name)).ok();

        let cells = edges
            .iter()
            .filter_map(|e| Some(((position(&e.first)?, position(&e.second)?), e.weight)))
            .collect();

        Self { index, cells }
    }

    /// Weight at `(row, col)`, if the cell is filled.
    #[must_use]
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        let r = self.index.iter().position(|n| n == row)?;
        let c = self.index.iter().position(|n| n == col)?;
        self.cells.get(&(r, c)).copied()
    }

    /// Color scale bounds over the filled cells.
    #[must_use]
    pub fn value_range(&self) -> Range<f64> {
        finite_or_unit(match finite_bounds(self.cells.values().copied()) {
            Some((lo, hi)) if hi > lo => lo..hi,
            Some((v, _)) => (v - 0.5)..(v + 0.5),
            None => 0.0..1.0,
        })
    }
}

/// Renders [`GraphRequest`]s as adjacency heatmaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeatmapRenderer;

impl HeatmapRenderer {
    #[allow(clippy::cast_precision_loss)]
    fn draw_colorbar(area: &Area<'_>, range: Range<f64>, theme: &Theme) -> Result<()> {
        let mut bar = ChartBuilder::on(area)
            .margin(chart_margin(theme))
            .margin_top(chart_margin(theme) * 2)
            .right_y_label_area_size(label_area(theme, 3.0))
            .build_cartesian_2d(0.0..1.0, range.clone())?;

        bar.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .label_style(theme.label_font())
            .draw()?;

        let span = range.end - range.start;
        let step = span / COLORBAR_STEPS as f64;
        bar.draw_series((0..COLORBAR_STEPS).map(|i| {
            let lo = range.start + step * i as f64;
            let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
            Rectangle::new([(0.0, lo), (1.0, lo + step)], rocket_r(t).filled())
        }))?;
        Ok(())
    }
}

impl PlotRenderer for HeatmapRenderer {
    type Request = GraphRequest;

    fn kind(&self) -> PlotKind {
        PlotKind::Heatmap
    }

    fn options<'r>(&self, request: &'r GraphRequest) -> &'r PlotOptions {
        &request.options
    }

    fn validate(&self, request: &GraphRequest, theme: &Theme) -> Result<()> {
        request.validate(theme.max_figsize_inches)
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw(&self, root: &Area<'_>, request: &GraphRequest, theme: &Theme) -> Result<()> {
        let matrix = HeatmapMatrix::from_request(request);
        let n = matrix.index.len();
        let labels: Vec<String> = matrix
            .index
            .iter()
            .map(|name| truncate_label(name, MAX_LABEL_CHARS))
            .collect();

        let area = titled_area(root, &request.options, theme)?;
        let (width, _) = area.dim_in_pixel();
        let colorbar_width = label_area(theme, 6.0).min(width / 3);
        let split = i32::try_from(width - colorbar_width).unwrap_or(i32::MAX);
        let (main, colorbar) = area.split_horizontally(split);

        let axis = -0.5..(n as f64 - 0.5);
        let label_space = label_area(theme, 1.0) + label_area(theme, 0.45) * 8;
        let mut chart = ChartBuilder::on(&main)
            .margin(chart_margin(theme))
            .x_label_area_size(label_space)
            .y_label_area_size(label_space)
            .build_cartesian_2d(axis.clone(), axis)?;

        let x_label = |v: &f64| slot_index(*v, n).map(|i| labels[i].clone()).unwrap_or_default();
        let y_label = |v: &f64| {
            slot_index(*v, n)
                .map(|i| labels[n - 1 - i].clone())
                .unwrap_or_default()
        };

        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh()
            .x_labels(n * 2)
            .y_labels(n * 2)
            .x_label_formatter(&x_label)
            .y_label_formatter(&y_label)
            .x_label_style(theme.label_font().transform(FontTransform::Rotate90))
            .y_label_style(theme.label_font());
        if let Some(xlabel) = &request.options.xlabel {
            mesh.x_desc(xlabel.as_str());
        }
        if let Some(ylabel) = &request.options.ylabel {
            mesh.y_desc(ylabel.as_str());
        }
        mesh.draw()?;

        let range = matrix.value_range();
        let span = range.end - range.start;
        let cell = |row: usize, col: usize| {
            let y = (n - 1 - row) as f64;
            let x = col as f64;
            [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)]
        };

        chart.draw_series(matrix.cells.iter().map(|(&(row, col), weight)| {
            let color = rocket_r((weight - range.start) / span);
            Rectangle::new(cell(row, col), color.filled())
        }))?;
        chart.draw_series(
            matrix
                .cells
                .keys()
                .map(|&(row, col)| Rectangle::new(cell(row, col), theme.background.stroke_width(1))),
        )?;

        Self::draw_colorbar(&colorbar, range, theme)?;
        Ok(())
    }
}
