use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use jaib_core::{ErrorKind, ExtractionError, ExtractionRequest};
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

/// `POST { "url": "..." }`: fetch the page and return the extracted article.
pub async fn fetch_article_handler(
    State(state): State<Arc<AppState>>, body: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();

    let mut response = match body {
        Ok(Json(request)) => {
            let span = tracing::info_span!("fetch_article", %request_id, url = %request.url);
            let outcome = tokio::time::timeout(state.request_timeout, state.extractor.process(&request))
                .instrument(span)
                .await;
            match outcome {
                Ok(Ok(article)) => Json(article).into_response(),
                Ok(Err(err)) => ApiError::from(err).into_response(),
                Err(_) => {
                    let budget_ms = state.request_timeout.as_millis() as u64;
                    tracing::warn!(%request_id, url = %request.url, budget_ms, "Request budget exceeded");
                    ApiError::from(ExtractionError::new(
                        ErrorKind::ArticleProcessingError,
                        format!("Article processing did not finish within {} ms", budget_ms),
                        request.url,
                    ))
                    .into_response()
                }
            }
        }
        Err(rejection) => {
            tracing::debug!(%request_id, error = %rejection.body_text(), "Rejected request body");
            ApiError::bad_body(rejection.body_text()).into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
