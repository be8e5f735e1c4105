//! Admin views over the audit log.

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use ocrbatch::db::upload_log_repo;

use crate::error::Result;
use crate::page;
use crate::state::AppState;

pub const CSV_FILENAME: &str = "upload_logs.csv";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/export_logs", get(export_logs))
}

/// GET /admin/dashboard - every audit record as an HTML table, most recent
/// first.
async fn dashboard(State(state): State<AppState>) -> Result<Html<String>> {
    let logs = upload_log_repo::list_recent(state.db())?;
    Ok(Html(page::dashboard(&logs)))
}

/// GET /admin/export_logs - the audit log as a CSV attachment.
async fn export_logs(State(state): State<AppState>) -> Result<Response> {
    let mut csv = Vec::new();
    let rows = upload_log_repo::export_csv(state.db(), &mut csv)?;
    tracing::info!(rows, "Audit log exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", CSV_FILENAME),
            ),
        ],
        csv,
    )
        .into_response())
}
