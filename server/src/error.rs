//! HTTP error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use engine::protocol::ErrorResponse;

/// A failed request, rendered in BigQuery's error envelope
#[derive(Debug)]
pub struct ApiError(pub engine::Error);

impl From<engine::Error> for ApiError {
    fn from(error: engine::Error) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::warn!("Request failed ({}): {}", status, self.0);

        (status, Json(ErrorResponse::from_error(&self.0))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;
