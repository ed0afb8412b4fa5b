use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jaib_core::{ErrorKind, ExtractionError};

/// An extraction failure rendered as `{ "error", "message", "sourceUrl" }`.
#[derive(Debug)]
pub struct ApiError(pub ExtractionError);

impl ApiError {
    /// Rejected request body; there is no URL to attribute it to.
    pub fn bad_body(message: impl std::fmt::Display) -> Self {
        Self(ExtractionError::new(ErrorKind::InvalidUrl, format!("Invalid request body: {}", message), ""))
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        Self(err)
    }
}

/// 400 for caller mistakes, 502 when the target site failed, 500 otherwise.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    if kind.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if kind.is_upstream_error() {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(self.0.kind), Json(self.0)).into_response()
    }
}
