//! Request payloads accepted by the renderers and their validation rules.

use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dsplot_common::{finite_bounds, DsError, FigSize, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Headroom an axis needs around the data for padding and annotations.
const AXIS_HEADROOM: f64 = 1.25;

/// Rejects values whose spread cannot be represented on a padded plot axis.
fn check_axis_span(values: impl IntoIterator<Item = f64>, what: &str, field: &str) -> Result<()> {
    let Some((lo, hi)) = finite_bounds(values) else {
        return Ok(());
    };
    let pad = (hi - lo) * AXIS_HEADROOM;
    if pad.is_finite() && (lo - pad).is_finite() && (hi + pad).is_finite() {
        Ok(())
    } else {
        Err(DsError::validation_field(
            format!("{what} span [{lo}, {hi}] is too wide to plot"),
            field,
        ))
    }
}

/// Options shared by every plot request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlotOptions {
    /// Chart title.
    pub title: Option<String>,
    /// Y axis label.
    pub ylabel: Option<String>,
    /// X axis label.
    pub xlabel: Option<String>,
    /// Figure size in inches.
    pub figsize: FigSize,
}

impl PlotOptions {
    /// Checks the figure size against the configured maximum.
    pub fn validate(&self, max_figsize_inches: f64) -> Result<()> {
        let FigSize(width, height) = self.figsize;
        let in_range = |side: f64| side.is_finite() && side > 0.0 && side <= max_figsize_inches;
        if in_range(width) && in_range(height) {
            Ok(())
        } else {
            Err(DsError::validation_field(
                format!(
                    "figsize must be two positive numbers no larger than {max_figsize_inches}, got {}",
                    self.figsize
                ),
                "figsize",
            ))
        }
    }
}

/// A colored point on the scatter map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Point {
    /// Point identifier, random when omitted.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Color tag used for grouping and coloring.
    pub color: String,
    /// Latitude, drawn on the y axis.
    pub lat: f64,
    /// Longitude, drawn on the x axis.
    pub lon: f64,
}

/// Scatter map request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PointsRequest {
    /// Points to draw.
    pub points: Vec<Point>,
    /// Shared plot options.
    #[serde(flatten)]
    pub options: PlotOptions,
}

impl PointsRequest {
    /// Validates the request.
    pub fn validate(&self, max_figsize_inches: f64) -> Result<()> {
        self.options.validate(max_figsize_inches)?;
        if self.points.is_empty() {
            return Err(DsError::validation_field("points cannot be empty", "points"));
        }
        if let Some(point) = self
            .points
            .iter()
            .find(|p| !p.lat.is_finite() || !p.lon.is_finite())
        {
            return Err(DsError::validation_field(
                format!("point {} has non-finite coordinates", point.id),
                "points",
            ));
        }
        check_axis_span(self.points.iter().map(|p| p.lon), "longitude", "points")?;
        check_axis_span(self.points.iter().map(|p| p.lat), "latitude", "points")
    }
}

const fn default_true() -> bool {
    true
}

/// Bar chart request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BarRequest {
    /// Bar heights keyed by label.
    pub values: BTreeMap<String, f64>,
    /// Keep only the first `limit` bars after sorting.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Sort ascending when true, descending otherwise.
    #[serde(default = "default_true")]
    pub asc: bool,
    /// Shared plot options.
    #[serde(flatten)]
    pub options: PlotOptions,
}

impl BarRequest {
    /// Validates the request.
    pub fn validate(&self, max_figsize_inches: f64) -> Result<()> {
        self.options.validate(max_figsize_inches)?;
        if self.values.is_empty() {
            return Err(DsError::validation_field("values cannot be empty", "values"));
        }
        if let Some((label, _)) = self.values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(DsError::validation_field(
                format!("value for '{label}' is not a finite number"),
                "values",
            ));
        }
        if self.limit == Some(0) {
            return Err(DsError::validation_field("limit must be at least 1", "limit"));
        }
        check_axis_span(
            self.values.values().copied().chain(std::iter::once(0.0)),
            "bar value",
            "values",
        )
    }

    /// Bars in draw order: sorted by value, ties kept in label order, truncated to `limit`.
    pub fn sorted_bars(&self) -> Vec<(&str, f64)> {
        let mut bars: Vec<(&str, f64)> = self.values.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        if self.asc {
            bars.sort_by(|a, b| a.1.total_cmp(&b.1));
        } else {
            bars.sort_by(|a, b| b.1.total_cmp(&a.1));
        }
        if let Some(limit) = self.limit {
            bars.truncate(limit);
        }
        bars
    }
}

/// A point in time on the time series x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub NaiveDateTime);

impl Timestamp {
    /// Seconds since the Unix epoch, ignoring any offset.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs_f64(self) -> f64 {
        let utc = self.0.and_utc();
        utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9
    }
}

impl FromStr for Timestamp {
    type Err = DsError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.naive_local()));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(Self(dt));
            }
        }
        if let Some(dt) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
        {
            return Ok(Self(dt));
        }
        Err(DsError::validation_field(
            format!("'{s}' is not a recognised timestamp"),
            "values",
        ))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// Time series request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeSeriesRequest {
    /// Series keyed by legend label, each mapping timestamps to values.
    pub values: BTreeMap<String, BTreeMap<Timestamp, f64>>,
    /// Format the x axis as time of day with hourly ticks.
    #[serde(default)]
    pub only_time: bool,
    /// Shared plot options.
    #[serde(flatten)]
    pub options: PlotOptions,
}

impl TimeSeriesRequest {
    /// Validates the request.
    pub fn validate(&self, max_figsize_inches: f64) -> Result<()> {
        self.options.validate(max_figsize_inches)?;
        if self.values.values().all(BTreeMap::is_empty) {
            return Err(DsError::validation_field(
                "values must contain at least one point",
                "values",
            ));
        }
        for (label, series) in &self.values {
            if let Some((ts, _)) = series.iter().find(|(_, v)| !v.is_finite()) {
                return Err(DsError::validation_field(
                    format!("series '{label}' has a non-finite value at {ts}"),
                    "values",
                ));
            }
        }
        check_axis_span(
            self.values.values().flat_map(|series| series.values().copied()),
            "series value",
            "values",
        )
    }
}

/// A weighted directed edge between two named nodes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphEdge {
    /// Source node name.
    pub first: String,
    /// Target node name.
    pub second: String,
    /// Edge weight.
    pub weight: f64,
}

impl GraphEdge {
    /// Builds an edge.
    pub fn new(first: impl Into<String>, second: impl Into<String>, weight: f64) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            weight,
        }
    }
}

const fn default_node_weight() -> f64 {
    1.0
}

/// Per-node metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphNode {
    /// Base64 encoded image drawn inside the node.
    #[serde(default)]
    pub image: Option<String>,
    /// Relative node size.
    #[serde(default = "default_node_weight")]
    pub weight: f64,
}

impl Default for GraphNode {
    fn default() -> Self {
        Self {
            image: None,
            weight: default_node_weight(),
        }
    }
}

impl GraphNode {
    /// Decodes the node image, if any.
    pub fn image_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.image
            .as_deref()
            .map(|encoded| {
                base64::engine::general_purpose::STANDARD
                    .decode(encoded.trim())
                    .map_err(|e| {
                        DsError::validation_field(format!("node image is not valid base64: {e}"), "nodes")
                    })
            })
            .transpose()
    }
}

/// Node placement strategy for the graph diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum GraphLayout {
    /// Nodes evenly spaced on a circle.
    #[default]
    Circular,
    /// Force-directed placement.
    Spring,
    /// Placement from Laplacian eigenvectors.
    Spectral,
    /// Concentric rings around a root node.
    CircularTree,
}

impl From<String> for GraphLayout {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "spring" => Self::Spring,
            "spectral" => Self::Spectral,
            "circular_tree" => Self::CircularTree,
            _ => Self::Circular,
        }
    }
}

impl GraphLayout {
    /// Wire name of the layout.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Circular => "circular",
            Self::Spring => "spring",
            Self::Spectral => "spectral",
            Self::CircularTree => "circular_tree",
        }
    }
}

impl fmt::Display for GraphLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graph diagram and heatmap request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphRequest {
    /// Edges, possibly repeated.
    pub edges: Vec<GraphEdge>,
    /// Optional per-node metadata keyed by node name.
    #[serde(default)]
    pub nodes: Option<BTreeMap<String, GraphNode>>,
    /// Root for the circular tree layout.
    #[serde(default)]
    pub root_node: Option<String>,
    /// Layout strategy; unset means circular.
    #[serde(default)]
    pub layout: Option<GraphLayout>,
    /// Color edges by weight tier.
    #[serde(default = "default_true")]
    pub weighted_edges: bool,
    /// Shared plot options.
    #[serde(flatten)]
    pub options: PlotOptions,
}

impl GraphRequest {
    /// Builds a request with default options over the given edges.
    pub fn from_edges(edges: Vec<GraphEdge>) -> Self {
        Self {
            edges,
            nodes: None,
            root_node: None,
            layout: None,
            weighted_edges: true,
            options: PlotOptions::default(),
        }
    }

    /// Effective layout.
    #[must_use]
    pub fn layout(&self) -> GraphLayout {
        self.layout.unwrap_or_default()
    }

    /// Validates the request.
    pub fn validate(&self, max_figsize_inches: f64) -> Result<()> {
        self.options.validate(max_figsize_inches)?;
        if self.edges.is_empty() {
            return Err(DsError::validation_field("edges cannot be empty", "edges"));
        }
        if let Some(edge) = self
            .edges
            .iter()
            .find(|e| !e.weight.is_finite() || e.weight < 0.0)
        {
            return Err(DsError::validation_field(
                format!(
                    "edge {} -> {} must have a finite non-negative weight",
                    edge.first, edge.second
                ),
                "edges",
            ));
        }
        if !self.edges.iter().map(|e| e.weight).sum::<f64>().is_finite() {
            return Err(DsError::validation_field(
                "total edge weight overflows",
                "edges",
            ));
        }
        if let Some(nodes) = &self.nodes {
            for (name, node) in nodes {
                if !node.weight.is_finite() {
                    return Err(DsError::validation_field(
                        format!("node '{name}' has a non-finite weight"),
                        "nodes",
                    ));
                }
                node.image_bytes()?;
            }
        }
        Ok(())
    }
}
