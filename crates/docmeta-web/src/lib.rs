//! HTTP surface for the PDF metadata extraction pipeline.
//!
//! Routes:
//! - `GET /` health status
//! - `POST /extract` multipart upload with a `file` field
//! - `GET /openapi.json` and `GET /docs` static API description

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod models;
pub mod openapi;
pub mod state;
mod template;
pub mod upload;

pub use state::AppState;

/// Build the application router around a shared [`AppState`].
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/", get(handlers::index::health))
        .route("/extract", post(handlers::extract::extract))
        .route(openapi::OPENAPI_PATH, get(handlers::docs::openapi_json))
        .route("/docs", get(handlers::docs::docs))
        .layer(body_limit)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
