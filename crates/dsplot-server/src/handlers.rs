//! Endpoint handlers.

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dsplot_common::DsError;
use dsplot_graphs::{BarRequest, GraphRequest, PointsRequest, TimeSeriesRequest};
use serde::Serialize;
use tracing::debug;

/// Multipart field carrying the image to classify.
pub const IMAGE_FIELD: &str = "image";

/// Encoded JPEG response body.
#[derive(Debug)]
pub struct Jpeg(pub Vec<u8>);

impl IntoResponse for Jpeg {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "image/jpeg")], self.0).into_response()
    }
}

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always true.
    pub success: bool,
}

/// Classifier response.
#[derive(Debug, Serialize)]
pub struct Prediction {
    /// Model score.
    pub prediction: f32,
}

/// `GET /health`
pub async fn health() -> Json<Health> {
    Json(Health { success: true })
}

/// `POST /points`
pub async fn points(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<PointsRequest>,
) -> ApiResult<Jpeg> {
    Ok(Jpeg(state.plots.draw_points(request).await?))
}

/// `POST /histogram`
pub async fn histogram(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BarRequest>,
) -> ApiResult<Jpeg> {
    Ok(Jpeg(state.plots.draw_bar(request).await?))
}

/// `POST /timeseries`
pub async fn timeseries(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TimeSeriesRequest>,
) -> ApiResult<Jpeg> {
    Ok(Jpeg(state.plots.draw_timeseries(request).await?))
}

/// `POST /graph`
pub async fn graph(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GraphRequest>,
) -> ApiResult<Jpeg> {
    Ok(Jpeg(state.plots.draw_graph(request).await?))
}

/// `POST /graph-as-heatmap`
pub async fn graph_as_heatmap(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GraphRequest>,
) -> ApiResult<Jpeg> {
    Ok(Jpeg(state.plots.draw_graph_as_heatmap(request).await?))
}

/// `POST /anime/predict`
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Prediction>> {
    let mut multipart = multipart?;
    let mut image = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            image = Some(field.bytes().await?);
            break;
        }
    }
    let image = image.ok_or_else(|| {
        DsError::validation_field("multipart field 'image' is required", IMAGE_FIELD)
    })?;
    debug!(bytes = image.len(), "Received image for classification");

    let classifier = state.classifier.clone();
    let prediction = tokio::task::spawn_blocking(move || classifier.predict(&image))
        .await
        .map_err(|e| ApiError::from(DsError::inference_with_source("Inference task failed", e)))??;

    Ok(Json(Prediction { prediction }))
}
