//! Integration tests for dsplot-common crate.

use dsplot_common::{DsError, FigSize, PlotKind};

#[test]
fn test_figsize_serde_as_pair() {
    let size: FigSize = serde_json::from_str("[12, 6.5]").unwrap();
    assert_eq!(size, FigSize(12.0, 6.5));

    let encoded = serde_json::to_string(&FigSize::default()).unwrap();
    assert_eq!(encoded, "[20.0,13.0]");
}

#[test]
fn test_figsize_to_pixels() {
    assert_eq!(FigSize(20.0, 13.0).to_pixels(100), (2000, 1300));
    assert_eq!(FigSize(0.001, 1.0).to_pixels(100), (1, 100));
    assert_eq!(FigSize(2.5, 2.5).to_pixels(10), (25, 25));
}

#[test]
fn test_plot_kind_names() {
    assert_eq!(PlotKind::TimeSeries.to_string(), "timeseries");
    assert_eq!(
        serde_json::to_string(&PlotKind::Heatmap).unwrap(),
        "\"heatmap\""
    );
}

#[test]
fn test_validation_error_is_client_error() {
    let error = DsError::validation_field("edges must not be empty", "edges");
    assert!(error.is_client_error());
    assert_eq!(error.field(), Some("edges"));
}
