//! GET /results - shows the stored ResultSet of a job.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};

use crate::flash::{Flash, FlashQuery, Redirect};
use crate::page;
use crate::routes::upload::JOB_COOKIE;
use crate::state::AppState;

pub const RESULTS_NOT_FOUND: &str = "Results not found. Please try uploading again.";

/// The job remembered in the caller's cookie; no cookie goes back to `/`.
pub async fn show_current(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FlashQuery>,
) -> Response {
    match job_from_cookie(&headers) {
        Some(job_id) => show(&state, &job_id, query.into_flash()),
        None => Redirect::to("/").into_response(),
    }
}

pub async fn show_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<FlashQuery>,
) -> Response {
    show(&state, &job_id, query.into_flash())
}

fn show(state: &AppState, job_id: &str, flash: Option<Flash>) -> Response {
    match state.jobs().read_results(job_id) {
        Ok(results) => Html(page::results(job_id, &results, flash.as_ref())).into_response(),
        Err(e) => {
            tracing::warn!(job_id, error = %e, "Results unavailable");
            Redirect::to("/")
                .with_flash(Flash::danger(RESULTS_NOT_FOUND))
                .into_response()
        }
    }
}

/// Reads the `job_id` cookie from the request headers.
pub fn job_from_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == JOB_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
