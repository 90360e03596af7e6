//! Colors, fonts and sizes shared by every renderer.

use dsplot_config::Config;
use plotters::style::{FontDesc, FontFamily, FontStyle, RGBColor};

/// Seaborn "Set2" qualitative palette.
pub const SET2: [RGBColor; 8] = [
    RGBColor(102, 194, 165),
    RGBColor(252, 141, 98),
    RGBColor(141, 160, 203),
    RGBColor(231, 138, 195),
    RGBColor(166, 216, 84),
    RGBColor(255, 217, 47),
    RGBColor(229, 196, 148),
    RGBColor(179, 179, 179),
];

/// Stops of the "rocket" sequential colormap, dark to light.
const ROCKET: [RGBColor; 8] = [
    RGBColor(3, 5, 26),
    RGBColor(53, 25, 62),
    RGBColor(112, 31, 87),
    RGBColor(173, 23, 89),
    RGBColor(225, 51, 66),
    RGBColor(243, 118, 81),
    RGBColor(246, 180, 143),
    RGBColor(250, 235, 221),
];

/// Palette color for the `index`-th series, cycling.
#[must_use]
pub const fn palette(index: usize) -> RGBColor {
    SET2[index % SET2.len()]
}

/// Reversed rocket colormap: `0.0` is lightest, `1.0` darkest.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn rocket_r(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = (1.0 - t) * (ROCKET.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(ROCKET.len() - 2);
    let frac = scaled - lower as f64;

    let (a, b) = (ROCKET[lower], ROCKET[lower + 1]);
    let lerp = |x: u8, y: u8| (f64::from(x) + (f64::from(y) - f64::from(x)) * frac).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Parses a `#rrggbb` color.
pub fn parse_hex_color(value: &str) -> Option<RGBColor> {
    let hex = value.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Resolves a basic color name, case-insensitively.
pub fn named_color(name: &str) -> Option<RGBColor> {
    let color = match name.trim().to_ascii_lowercase().as_str() {
        "red" => RGBColor(255, 0, 0),
        "blue" => RGBColor(0, 0, 255),
        "green" => RGBColor(0, 128, 0),
        "black" => RGBColor(0, 0, 0),
        "white" => RGBColor(255, 255, 255),
        "yellow" => RGBColor(255, 255, 0),
        "orange" => RGBColor(255, 165, 0),
        "purple" => RGBColor(128, 0, 128),
        "pink" => RGBColor(255, 192, 203),
        "brown" => RGBColor(165, 42, 42),
        "gray" | "grey" => RGBColor(128, 128, 128),
        "cyan" => RGBColor(0, 255, 255),
        "magenta" => RGBColor(255, 0, 255),
        _ => return None,
    };
    Some(color)
}

/// Color for a point tag: a named color, a hex color, or the palette entry for `fallback_index`.
pub fn tag_color(tag: &str, fallback_index: usize) -> RGBColor {
    named_color(tag)
        .or_else(|| parse_hex_color(tag))
        .unwrap_or_else(|| palette(fallback_index))
}

/// Immutable rendering settings built once from configuration.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Canvas resolution.
    pub pixels_per_inch: u32,
    /// Density stored in the JPEG header.
    pub dpi: u16,
    /// JPEG quality.
    pub jpeg_quality: u8,
    /// Largest accepted figure side in inches.
    pub max_figsize_inches: f64,
    /// Canvas background.
    pub background: RGBColor,
    /// Font family for all text.
    pub font_family: String,
    /// Node marker area range in square points.
    pub node_size_range: [f64; 2],
    /// Node marker area without per-node weights.
    pub default_node_size: f64,
    /// Edge stroke width in pixels.
    pub edge_width: u32,
    /// Edge colors for the low, middle and high tiers.
    pub tier_colors: [RGBColor; 3],
    /// Steps of the force-directed layout.
    pub spring_iterations: usize,
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Theme {
    /// Builds the theme from validated configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let render = &config.render;
        let graph = &config.graph;
        let tier = |i: usize| parse_hex_color(&graph.tier_colors[i]).unwrap_or(RGBColor(0, 0, 0));

        Self {
            pixels_per_inch: render.pixels_per_inch,
            dpi: render.dpi,
            jpeg_quality: render.jpeg_quality,
            max_figsize_inches: render.max_figsize_inches,
            background: parse_hex_color(&render.background).unwrap_or(RGBColor(255, 255, 255)),
            font_family: render.font_family.clone(),
            node_size_range: graph.node_size_range,
            default_node_size: graph.default_node_size,
            edge_width: graph.edge_width,
            tier_colors: [tier(0), tier(1), tier(2)],
            spring_iterations: graph.spring_iterations,
        }
    }

    /// Converts typographic points to pixels at the canvas resolution.
    #[must_use]
    pub fn points_to_px(&self, points: f64) -> f64 {
        points * f64::from(self.pixels_per_inch) / 72.0
    }

    /// Radius in pixels of a marker whose area is `area` square points.
    #[must_use]
    pub fn marker_radius(&self, area: f64) -> f64 {
        self.points_to_px(area.max(0.0).sqrt() / 2.0)
    }

    /// Font of the configured family at `points` size.
    #[must_use]
    pub fn font(&self, points: f64) -> FontDesc<'_> {
        FontDesc::new(
            FontFamily::from(self.font_family.as_str()),
            self.points_to_px(points),
            FontStyle::Normal,
        )
    }

    /// Title font.
    #[must_use]
    pub fn title_font(&self) -> FontDesc<'_> {
        self.font(12.0)
    }

    /// Axis label and tick font.
    #[must_use]
    pub fn label_font(&self) -> FontDesc<'_> {
        self.font(10.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#a31621"), Some(RGBColor(0xa3, 0x16, 0x21)));
        assert_eq!(parse_hex_color("a31621"), None);
        assert_eq!(parse_hex_color("#a3162"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn test_tag_color_resolution() {
        assert_eq!(tag_color("RED", 3), RGBColor(255, 0, 0));
        assert_eq!(tag_color("#010203", 3), RGBColor(1, 2, 3));
        assert_eq!(tag_color("mauve-ish", 1), SET2[1]);
        assert_eq!(tag_color("unknown", 9), SET2[1]);
    }

    #[test]
    fn test_rocket_r_endpoints() {
        assert_eq!(rocket_r(0.0), ROCKET[7]);
        assert_eq!(rocket_r(1.0), ROCKET[0]);
        assert_eq!(rocket_r(f64::NAN), ROCKET[7]);
        // lighter for smaller values
        let brightness = |c: RGBColor| u32::from(c.0) + u32::from(c.1) + u32::from(c.2);
        assert!(brightness(rocket_r(0.2)) > brightness(rocket_r(0.8)));
    }

    #[test]
    fn test_theme_from_config() {
        let theme = Theme::default();
        assert_eq!(theme.background, RGBColor(255, 255, 255));
        assert_eq!(theme.tier_colors[2], RGBColor(0xa3, 0x16, 0x21));
        assert!((theme.points_to_px(72.0) - 100.0).abs() < 1e-9);
        assert!((theme.marker_radius(3000.0) - theme.points_to_px(3000f64.sqrt() / 2.0)).abs() < 1e-9);
    }
}
