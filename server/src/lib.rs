//! HTTP front end for the ocrbatch pipeline.
//!
//! Thin axum glue: routes hand uploads to the batch runner, read stored
//! results back, and stream exports. All OCR work happens in the library.

pub mod error;
pub mod flash;
pub mod page;
pub mod routes;
pub mod settings;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Builds the application router over `state`.
pub fn app(state: AppState) -> Router {
    let static_dir = state.config().storage.static_dir.clone();
    let body_limit = state.config().limits.max_upload_bytes;

    Router::new()
        .merge(routes::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
