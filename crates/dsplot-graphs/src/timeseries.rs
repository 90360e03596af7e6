//! Line chart of one or more time series.

use crate::canvas::Area;
use crate::points::padded_range;
use crate::renderer::{chart_margin, label_area, titled_area, PlotRenderer};
use crate::theme::{palette, Theme};
use crate::types::{PlotOptions, TimeSeriesRequest, Timestamp};
use chrono::{Duration, NaiveDateTime, Timelike};
use dsplot_common::{DsError, PlotKind, Result};
use plotters::prelude::*;

const SECONDS_PER_HOUR: f64 = 3600.0;
const MAX_HOUR_TICKS: usize = 25;

/// Maps timestamps to hours since the first whole hour of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourAxis {
    origin: NaiveDateTime,
}

impl HourAxis {
    /// Axis anchored at the whole hour at or before `earliest`.
    #[must_use]
    pub fn new(earliest: Timestamp) -> Self {
        let origin = earliest
            .0
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(earliest.0);
        Self { origin }
    }

    /// Position of `timestamp` on the axis, in hours.
    #[must_use]
    pub fn position(&self, timestamp: Timestamp) -> f64 {
        (timestamp.as_secs_f64() - Timestamp(self.origin).as_secs_f64()) / SECONDS_PER_HOUR
    }

    /// Timestamp at axis position `hours`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn timestamp(&self, hours: f64) -> NaiveDateTime {
        let millis = (hours * SECONDS_PER_HOUR * 1000.0).round() as i64;
        self.origin + Duration::milliseconds(millis)
    }

    /// Tick label for axis position `hours`.
    #[must_use]
    pub fn label(&self, hours: f64, only_time: bool, span_hours: f64) -> String {
        let format = if only_time {
            "%H:%M"
        } else if span_hours > 48.0 {
            "%Y-%m-%d"
        } else {
            "%m-%d %H:%M"
        };
        self.timestamp(hours).format(format).to_string()
    }
}

/// Renders [`TimeSeriesRequest`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeriesRenderer;

impl PlotRenderer for TimeSeriesRenderer {
    type Request = TimeSeriesRequest;

    fn kind(&self) -> PlotKind {
        PlotKind::TimeSeries
    }

    fn options<'r>(&self, request: &'r TimeSeriesRequest) -> &'r PlotOptions {
        &request.options
    }

    fn validate(&self, request: &TimeSeriesRequest, theme: &Theme) -> Result<()> {
        request.validate(theme.max_figsize_inches)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn draw(&self, root: &Area<'_>, request: &TimeSeriesRequest, theme: &Theme) -> Result<()> {
        let area = titled_area(root, &request.options, theme)?;

        let earliest = request
            .values
            .values()
            .filter_map(|series| series.keys().next())
            .min()
            .copied()
            .ok_or_else(|| {
                DsError::validation_field("values must contain at least one point", "values")
            })?;
        let axis = HourAxis::new(earliest);

        let series: Vec<(&str, Vec<(f64, f64)>)> = request
            .values
            .iter()
            .map(|(label, points)| {
                (
                    label.as_str(),
                    points.iter().map(|(t, v)| (axis.position(*t), *v)).collect(),
                )
            })
            .collect();

        let x_range = padded_range(series.iter().flat_map(|(_, s)| s.iter().map(|p| p.0)));
        let y_range = padded_range(series.iter().flat_map(|(_, s)| s.iter().map(|p| p.1)));
        let span = x_range.end - x_range.start;

        let mut chart = ChartBuilder::on(&area)
            .margin(chart_margin(theme))
            .x_label_area_size(label_area(theme, 2.0))
            .y_label_area_size(label_area(theme, 3.0))
            .build_cartesian_2d(x_range, y_range)?;

        let x_formatter = |hours: &f64| axis.label(*hours, request.only_time, span);
        let mut mesh = chart.configure_mesh();
        mesh.label_style(theme.label_font())
            .x_label_formatter(&x_formatter);
        if request.only_time {
            mesh.x_labels((span.ceil() as usize + 1).min(MAX_HOUR_TICKS));
        }
        if let Some(xlabel) = &request.options.xlabel {
            mesh.x_desc(xlabel.as_str());
        }
        if let Some(ylabel) = &request.options.ylabel {
            mesh.y_desc(ylabel.as_str());
        }
        mesh.draw()?;

        let dot_radius = theme.points_to_px(0.75).max(1.0).round() as i32;
        let dot_spacing = theme.points_to_px(11.0).max(4.0);
        let marker_radius = theme.points_to_px(3.0).max(2.0).round() as i32;

        for (index, (label, points)) in series.iter().enumerate() {
            let color = palette(index);

            chart.draw_series(DottedLineSeries::new(
                points.iter().copied(),
                0.0,
                dot_spacing,
                move |c| Circle::new(c, dot_radius, color.filled()),
            ))?;

            chart
                .draw_series(
                    points
                        .iter()
                        .map(|p| Circle::new(*p, marker_radius, color.filled())),
                )?
                .label(*label)
                .legend(move |(x, y)| Circle::new((x, y), marker_radius, color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .label_font(theme.label_font())
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> Timestamp {
        raw.parse().unwrap()
    }

    #[test]
    fn test_hour_axis_anchors_on_whole_hour() {
        let axis = HourAxis::new(ts("2024-01-01T10:30:00"));
        assert!((axis.position(ts("2024-01-01T10:30:00")) - 0.5).abs() < 1e-9);
        assert!((axis.position(ts("2024-01-01T12:00:00")) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_hour_axis_labels() {
        let axis = HourAxis::new(ts("2024-01-01T10:00:00"));
        assert_eq!(axis.label(1.0, true, 3.0), "11:00");
        assert_eq!(axis.label(0.0, false, 3.0), "01-01 10:00");
        assert_eq!(axis.label(30.0, false, 72.0), "2024-01-02");
    }
}
