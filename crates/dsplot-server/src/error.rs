//! HTTP error responses.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dsplot_common::DsError;
use serde::Serialize;
use tracing::error;

/// Error returned by every handler.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Error raised by validation, rendering or inference.
    #[error(transparent)]
    Service(#[from] DsError),

    /// The request could not be read as the expected body.
    #[error("{message}")]
    Rejected {
        /// Response status.
        status: StatusCode,
        /// Description sent to the client.
        message: String,
    },
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
    field: Option<&'a str>,
}

fn error_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad_request",
        StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
        StatusCode::UNPROCESSABLE_ENTITY => "validation_error",
        _ => "request_error",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Service(DsError::Validation { message, field }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: "validation_error",
                    message,
                    field: field.as_deref(),
                },
            ),
            Self::Service(err) => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal_error",
                        message: "Internal server error",
                        field: None,
                    },
                )
            }
            Self::Rejected { status, message } => (
                *status,
                ErrorBody {
                    error: error_code(*status),
                    message,
                    field: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let message = err.body_text();
                Self::Service(match data_error_field(&message) {
                    Some(field) => DsError::validation_field(message, field),
                    None => DsError::validation(message),
                })
            }
            other => Self::Rejected {
                status: other.status(),
                message: other.body_text(),
            },
        }
    }
}

/// Top-level request field named in a JSON data error message.
///
/// Errors below the root are prefixed with their path (`points[0].lat: ...`);
/// errors at the root name the field in backticks (``missing field `points` ``).
fn data_error_field(message: &str) -> Option<String> {
    let detail = message
        .split_once("target type: ")
        .map_or(message, |(_, rest)| rest);

    if let Some((path, _)) = detail.split_once(": ") {
        let top = &path[..path.find(['.', '[']).unwrap_or(path.len())];
        if !top.is_empty() && top.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Some(top.to_string());
        }
    }

    ["missing field `", "unknown field `", "duplicate field `"]
        .iter()
        .find_map(|marker| {
            let (_, rest) = detail.split_once(marker)?;
            rest.split_once('`').map(|(name, _)| name.to_string())
        })
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Rejected {
            status: err.status(),
            message: err.body_text(),
        }
    }
}
