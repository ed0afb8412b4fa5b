//! HTTP front end for the article extraction pipeline.
//!
//! Exposes the pipeline at `POST /` and `POST /functions/v1/fetch-article-data`
//! with permissive CORS so the web app can call it from the browser.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method};
use axum::routing::{get, post};
use jaib_core::Extractor;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;

pub use config::ServerConfig;

/// Path the web app calls.
pub const FUNCTION_PATH: &str = "/functions/v1/fetch-article-data";

/// Shared, read-only application state.
pub struct AppState {
    pub extractor: Extractor,
    /// Budget for a whole extraction request, fetch included.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(extractor: Extractor, request_timeout: Duration) -> Self {
        Self { extractor, request_timeout }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(Extractor::with_fetch_config(config.fetch_config()), config.request_timeout())
    }
}

/// Allows any origin with the headers the web app's client sends.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::fetch_article_handler))
        .route(FUNCTION_PATH, post(handlers::fetch_article_handler))
        .route("/health", get(handlers::health_handler))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
