//! POST /upload - runs one batch over the submitted files.

use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};

use ocrbatch::config::is_valid_language;
use ocrbatch::{Upload, UploadOutcome};

use crate::error::Result;
use crate::flash::{Flash, Redirect};
use crate::state::AppState;

/// Multipart field carrying the uploaded files.
pub const FILES_FIELD: &str = "files[]";
pub const LANGUAGE_FIELD: &str = "language";
/// Cookie remembering the caller's most recent job.
pub const JOB_COOKIE: &str = "job_id";

pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response> {
    let mut uploads = Vec::new();
    let mut saw_files_field = false;
    let mut language = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(FILES_FIELD) => {
                saw_files_field = true;
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was chosen.
                if !filename.is_empty() {
                    uploads.push(Upload::new(filename, bytes.to_vec()));
                }
            }
            Some(LANGUAGE_FIELD) => language = Some(field.text().await?),
            _ => {}
        }
    }

    if !saw_files_field {
        return Ok(Redirect::to("/")
            .with_flash(Flash::danger("No file part"))
            .into_response());
    }
    if uploads.is_empty() {
        return Ok(Redirect::to("/")
            .with_flash(Flash::danger("No selected file"))
            .into_response());
    }

    let language = language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| state.config().ocr.default_language.clone());
    if !is_valid_language(&language) {
        return Ok(Redirect::to("/")
            .with_flash(Flash::danger(format!("Invalid language code: {}", language)))
            .into_response());
    }

    tracing::info!(files = uploads.len(), language = %language, "Upload received");

    let runner = state.runner().clone();
    let report = tokio::task::spawn_blocking(move || runner.run(uploads, &language)).await??;

    let flashes: Vec<Flash> = report.outcomes.iter().filter_map(outcome_flash).collect();

    Ok(Redirect::to("/results")
        .with_optional_flash(Flash::combine(&flashes))
        .with_cookie(job_cookie(&report.job_id.to_string()))
        .into_response())
}

fn outcome_flash(outcome: &UploadOutcome) -> Option<Flash> {
    match outcome {
        UploadOutcome::Processed { .. } => None,
        UploadOutcome::Failed { filename, error } => Some(Flash::danger(format!(
            "An error occurred while processing {}: {}",
            filename, error
        ))),
        UploadOutcome::Rejected { filename } => Some(Flash::warning(format!(
            "File type not allowed for {}",
            filename
        ))),
    }
}

fn job_cookie(job_id: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", JOB_COOKIE, job_id)
}
