//! Route handlers.

pub mod admin;
pub mod download;
pub mod health;
pub mod index;
pub mod results;
pub mod upload;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::health_check))
        .route("/upload", post(upload::upload_files))
        .route("/results", get(results::show_current))
        .route("/results/{job_id}", get(results::show_job))
        .route(
            "/download/{job_id}/{file_index}/{format}",
            get(download::download_file),
        )
        .nest("/admin", admin::router())
}
