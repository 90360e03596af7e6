//! Router tests for dsplot-server.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use dsplot_common::test_utils::{init_test_logging, payload_fixtures};
use dsplot_common::{DsError, Result};
use dsplot_graphs::{PlotService, Theme};
use dsplot_server::{app, AppState, PROCESS_TIME_HEADER};
use dsplot_vision::Predictor;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "dsplot-test-boundary";

/// Scores every image with the byte count, rejects empty input.
struct ByteCount;

impl Predictor for ByteCount {
    #[allow(clippy::cast_precision_loss)]
    fn predict(&self, bytes: &[u8]) -> Result<f32> {
        if bytes.is_empty() {
            return Err(DsError::validation_field("image is empty", "image"));
        }
        Ok(bytes.len() as f32)
    }
}

fn router() -> Router {
    init_test_logging();
    app(AppState::new(
        PlotService::new(Theme::default()),
        Arc::new(ByteCount),
        1024 * 1024,
    ))
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_post(field: &str, payload: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"a.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/anime/predict")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_success_and_timing() {
    let response = router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let elapsed: f64 = response.headers()[PROCESS_TIME_HEADER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(elapsed >= 0.0);
    assert_eq!(json_body(response).await, serde_json::json!({"success": true}));
}

#[tokio::test]
async fn test_validation_error_is_422_with_field() {
    for uri in ["/histogram", "/draw-histogram", "/plot/histogram"] {
        let response = router()
            .oneshot(json_post(uri, r#"{"values": {}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert!(response.headers().contains_key(PROCESS_TIME_HEADER));

        let body = json_body(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["field"], "values");
    }
}

#[tokio::test]
async fn test_graph_validation_errors() {
    let response = router()
        .oneshot(json_post(
            "/graph",
            r#"{"edges": [{"first": "a", "second": "b", "weight": 1}], "layout": "circular_tree"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["field"], "root_node");

    let response = router()
        .oneshot(json_post("/graph-as-heatmap", r#"{"edges": []}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unplottable_spans_are_422() {
    let cases = [
        (
            "/points",
            r#"{"points": [{"color": "red", "lat": 1e308, "lon": 0}, {"color": "red", "lat": -1e308, "lon": 0}]}"#,
            "points",
        ),
        ("/histogram", r#"{"values": {"a": 1e308, "b": -1e308}}"#, "values"),
        (
            "/timeseries",
            r#"{"values": {"s": {"2024-01-01": 1e308, "2024-01-02": -1e308}}}"#,
            "values",
        ),
    ];
    for (uri, body, field) in cases {
        let response = router().oneshot(json_post(uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert_eq!(json_body(response).await["field"], field, "{uri}");
    }
}

#[tokio::test]
async fn test_wrong_shape_is_422() {
    let response = router()
        .oneshot(json_post("/points", r#"{"points": "nope"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["field"], "points");

    let response = router()
        .oneshot(json_post("/histogram", r#"{"title": "no values"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["field"], "values");
    assert!(body["message"].as_str().unwrap().contains("missing field"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let response = router()
        .oneshot(json_post("/timeseries", r#"{"values": "#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_missing_content_type_is_415() {
    let response = router()
        .oneshot(
            Request::post("/histogram")
                .body(Body::from(payload_fixtures::bar_json()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_predict_returns_score() {
    let response = router()
        .oneshot(multipart_post("image", b"12345"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"prediction": 5.0}));
}

#[tokio::test]
async fn test_predict_requires_image_field() {
    let response = router()
        .oneshot(multipart_post("file", b"12345"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["field"], "image");
}

#[tokio::test]
async fn test_predict_requires_multipart() {
    let response = router()
        .oneshot(json_post("/anime/predict", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = router()
        .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plot_endpoints_return_jpeg() {
    let cases = [
        ("/points", payload_fixtures::points_json()),
        ("/histogram", payload_fixtures::bar_json()),
        ("/timeseries", payload_fixtures::timeseries_json()),
        ("/graph", payload_fixtures::graph_json()),
        ("/plot/graph-as-heatmap", payload_fixtures::graph_json()),
    ];
    for (uri, body) in cases {
        let response = router().oneshot(json_post(uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
