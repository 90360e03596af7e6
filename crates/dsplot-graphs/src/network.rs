//! Node-link diagram of a weighted graph.

use crate::canvas::Area;
use crate::layout::{LayoutParams, Position};
use crate::preprocess::{EdgeTier, PreparedGraph};
use crate::renderer::{chart_margin, titled_area, PlotRenderer};
use crate::theme::{palette, Theme};
use crate::types::{GraphRequest, PlotOptions};
use dsplot_common::{DsError, PlotKind, Result};
use image::imageops::FilterType;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::debug;

/// Node label size in points.
const LABEL_POINTS: f64 = 15.0;
/// Share of the node diameter covered by a node image.
const IMAGE_SCALE: f64 = 0.7;
/// Legend swatch stroke width in points.
const LEGEND_STROKE_POINTS: f64 = 5.0;

/// Everything the diagram needs, resolved from the request.
#[derive(Debug, Clone)]
pub struct DiagramModel {
    /// Preprocessed graph.
    pub graph: PreparedGraph,
    /// Node positions in node order.
    pub positions: Vec<Position>,
    /// Node marker areas in node order.
    pub sizes: Vec<f64>,
    /// Edge tiers in edge order.
    pub tiers: Vec<EdgeTier>,
}

impl DiagramModel {
    /// Prepares the graph and computes layout, node sizes and edge tiers.
    pub fn build(request: &GraphRequest, theme: &Theme) -> Result<Self> {
        let graph = PreparedGraph::prepare(request)?;
        let positions = graph.layout.positions(
            &graph,
            LayoutParams {
                spring_iterations: theme.spring_iterations,
            },
        );
        let sizes = graph.node_sizes(theme.node_size_range, theme.default_node_size);
        let tiers = graph.edge_tiers();
        debug!(
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            layout = %graph.layout,
            "Built diagram model"
        );
        Ok(Self {
            graph,
            positions,
            sizes,
            tiers,
        })
    }

    /// Edge color for a tier, or black when edges are unweighted.
    #[must_use]
    pub fn edge_color(tier: EdgeTier, weighted: bool, theme: &Theme) -> RGBColor {
        if weighted {
            theme.tier_colors[tier.index()]
        } else {
            BLACK
        }
    }
}

/// Decodes a node image and scales it to fit a `side` pixel square.
fn node_thumbnail(bytes: &[u8], side: u32, node: &str) -> Result<image::RgbImage> {
    let decoded = image::load_from_memory(bytes).map_err(|e| {
        DsError::validation_field(format!("image for node '{node}' cannot be decoded: {e}"), "nodes")
    })?;
    Ok(decoded.resize(side, side, FilterType::CatmullRom).to_rgb8())
}

/// Renders [`GraphRequest`]s as node-link diagrams.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphRenderer;

impl GraphRenderer {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    fn draw_node_image(
        root: &Area<'_>,
        center: (i32, i32),
        radius: f64,
        bytes: &[u8],
        node: &str,
    ) -> Result<()> {
        let side = (radius * 2.0 * IMAGE_SCALE).round().max(1.0) as u32;
        let thumbnail = node_thumbnail(bytes, side, node)?;
        let (w, h) = thumbnail.dimensions();
        let origin = (center.0 - (w / 2) as i32, center.1 - (h / 2) as i32);
        let r2 = radius * radius;

        for (x, y, pixel) in thumbnail.enumerate_pixels() {
            let (px, py) = (origin.0 + x as i32, origin.1 + y as i32);
            let (dx, dy) = (f64::from(px - center.0), f64::from(py - center.1));
            if dx * dx + dy * dy <= r2 {
                let [r, g, b] = pixel.0;
                root.draw_pixel((px, py), &RGBColor(r, g, b))?;
            }
        }
        Ok(())
    }

    fn draw_label(root: &Area<'_>, center: (i32, i32), text: &str, theme: &Theme) -> Result<()> {
        let style = TextStyle::from(theme.font(LABEL_POINTS))
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        let (w, h) = root.estimate_text_size(text, &style)?;
        let (half_w, half_h) = (i32::try_from(w / 2).unwrap_or(0), i32::try_from(h / 2).unwrap_or(0));
        let pad = half_h / 2 + 2;

        let corners = [
            (center.0 - half_w - pad, center.1 - half_h - pad),
            (center.0 + half_w + pad, center.1 + half_h + pad),
        ];
        root.draw(&Rectangle::new(corners, WHITE.filled()))?;
        root.draw(&Rectangle::new(corners, BLACK.stroke_width(1)))?;
        root.draw(&Text::new(text.to_string(), center, style))?;
        Ok(())
    }
}

impl PlotRenderer for GraphRenderer {
    type Request = GraphRequest;

    fn kind(&self) -> PlotKind {
        PlotKind::Graph
    }

    fn options<'r>(&self, request: &'r GraphRequest) -> &'r PlotOptions {
        &request.options
    }

    fn validate(&self, request: &GraphRequest, theme: &Theme) -> Result<()> {
        request.validate(theme.max_figsize_inches)?;
        PreparedGraph::prepare(request).map(|_| ())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw(&self, root: &Area<'_>, request: &GraphRequest, theme: &Theme) -> Result<()> {
        let model = DiagramModel::build(request, theme)?;
        let area = titled_area(root, &request.options, theme)?;

        let radii: Vec<f64> = model.sizes.iter().map(|s| theme.marker_radius(*s)).collect();
        let max_radius = radii.iter().copied().fold(0.0_f64, f64::max);
        let margin = chart_margin(theme) + max_radius.ceil() as u32;

        let mut chart = ChartBuilder::on(&area)
            .margin(margin)
            .build_cartesian_2d(-1.0_f64..1.0_f64, -1.0_f64..1.0_f64)?;

        let index = model.graph.node_index();
        let stroke = theme.edge_width;
        chart.draw_series(
            model
                .graph
                .edges
                .iter()
                .zip(&model.tiers)
                .filter(|(edge, _)| edge.first != edge.second)
                .filter_map(|(edge, tier)| {
                    let a = *index.get(edge.first.as_str())?;
                    let b = *index.get(edge.second.as_str())?;
                    let color = DiagramModel::edge_color(*tier, request.weighted_edges, theme);
                    Some(PathElement::new(
                        vec![model.positions[a], model.positions[b]],
                        color.stroke_width(stroke),
                    ))
                }),
        )?;

        chart.draw_series(
            model
                .positions
                .iter()
                .zip(&radii)
                .enumerate()
                .map(|(i, (pos, radius))| Circle::new(*pos, radius.round() as i32, palette(i).filled())),
        )?;

        let centers: Vec<(i32, i32)> = model.positions.iter().map(|p| chart.backend_coord(p)).collect();

        if let Some(metadata) = &model.graph.metadata {
            for (i, name) in model.graph.nodes.iter().enumerate() {
                let Some(node) = metadata.get(name) else {
                    continue;
                };
                if let Some(bytes) = node.image_bytes()? {
                    Self::draw_node_image(root, centers[i], radii[i], &bytes, name)?;
                }
            }
        }

        for (name, center) in model.graph.nodes.iter().zip(&centers) {
            Self::draw_label(root, *center, name, theme)?;
        }

        if request.weighted_edges {
            let swatch = theme.points_to_px(LEGEND_STROKE_POINTS).round().max(1.0) as u32;
            for tier in EdgeTier::ALL {
                let color = theme.tier_colors[tier.index()];
                chart
                    .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                    .label(tier.label())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(swatch))
                    });
            }
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .label_font(theme.label_font())
                .background_style(&WHITE.mix(0.9))
                .border_style(&BLACK)
                .draw()?;
        }

        Ok(())
    }
}
