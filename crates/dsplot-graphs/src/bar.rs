//! Bar chart of labelled values.

use crate::canvas::Area;
use crate::points::finite_or_unit;
use crate::renderer::{chart_margin, label_area, slot_index, titled_area, PlotRenderer};
use crate::theme::{palette, Theme};
use crate::types::{BarRequest, PlotOptions};
use dsplot_common::{format_bar_value, truncate_label, PlotKind, Result};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

const MAX_LABEL_CHARS: usize = 24;
const BAR_HALF_WIDTH: f64 = 0.4;

/// Value axis range including zero, with headroom for the annotations.
pub fn value_range(values: &[f64]) -> Range<f64> {
    let lo = values.iter().copied().fold(0.0_f64, f64::min);
    let hi = values.iter().copied().fold(0.0_f64, f64::max);
    if hi - lo <= 0.0 {
        return 0.0..1.0;
    }
    let pad = (hi - lo) * 0.1;
    finite_or_unit((if lo < 0.0 { lo - pad } else { lo })..(hi + pad))
}

/// Renders [`BarRequest`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarRenderer;

impl PlotRenderer for BarRenderer {
    type Request = BarRequest;

    fn kind(&self) -> PlotKind {
        PlotKind::Bar
    }

    fn options<'r>(&self, request: &'r BarRequest) -> &'r PlotOptions {
        &request.options
    }

    fn validate(&self, request: &BarRequest, theme: &Theme) -> Result<()> {
        request.validate(theme.max_figsize_inches)
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw(&self, root: &Area<'_>, request: &BarRequest, theme: &Theme) -> Result<()> {
        let area = titled_area(root, &request.options, theme)?;
        let bars = request.sorted_bars();
        let values: Vec<f64> = bars.iter().map(|(_, v)| *v).collect();
        let labels: Vec<String> = bars
            .iter()
            .map(|(label, _)| truncate_label(label, MAX_LABEL_CHARS))
            .collect();
        let y_range = value_range(&values);
        let pad = (y_range.end - y_range.start) * 0.01;

        let x_range = -0.5..(bars.len() as f64 - 0.5);
        let mut chart = ChartBuilder::on(&area)
            .margin(chart_margin(theme))
            .x_label_area_size(label_area(theme, 1.0) + label_area(theme, 0.45) * 8)
            .y_label_area_size(label_area(theme, 1.0))
            .build_cartesian_2d(x_range, y_range)?;

        let label_for = |value: &f64| {
            slot_index(*value, labels.len())
                .map(|i| labels[i].clone())
                .unwrap_or_default()
        };

        let hidden = |_: &f64| String::new();

        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh()
            .x_labels(bars.len() * 2)
            .x_label_formatter(&label_for)
            .x_label_style(theme.label_font().transform(FontTransform::Rotate90))
            .y_label_formatter(&hidden)
            .label_style(theme.label_font());
        if let Some(xlabel) = &request.options.xlabel {
            mesh.x_desc(xlabel.as_str());
        }
        if let Some(ylabel) = &request.options.ylabel {
            mesh.y_desc(ylabel.as_str());
        }
        mesh.draw()?;

        chart.draw_series(values.iter().enumerate().map(|(i, v)| {
            let center = i as f64;
            Rectangle::new(
                [(center - BAR_HALF_WIDTH, 0.0), (center + BAR_HALF_WIDTH, *v)],
                palette(i).filled(),
            )
        }))?;

        let annotation_style = TextStyle::from(theme.label_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        chart.draw_series(values.iter().enumerate().map(|(i, v)| {
            let anchor = if *v >= 0.0 { v + pad } else { *v - pad };
            Text::new(format_bar_value(*v), (i as f64, anchor), annotation_style.clone())
        }))?;

        Ok(())
    }
}
