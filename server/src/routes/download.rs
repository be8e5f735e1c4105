//! GET /download/{job_id}/{file_index}/{format} - exports one file of a job.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use ocrbatch::ExportError;

use crate::error::Result;
use crate::flash::{Flash, Redirect};
use crate::state::AppState;

pub const FILE_NOT_FOUND: &str = "Could not find the file to download.";
pub const INVALID_FORMAT: &str = "Invalid download format.";

pub async fn download_file(
    State(state): State<AppState>,
    Path((job_id, file_index, format)): Path<(String, usize, String)>,
) -> Result<Response> {
    let result = match state.jobs().file_result(&job_id, file_index) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(job_id = %job_id, file_index, error = %e, "Download lookup failed");
            return Ok(back_to_results(FILE_NOT_FOUND));
        }
    };

    let exporter = state.exporter().clone();
    let exported = tokio::task::spawn_blocking(move || exporter.export(&result, &format)).await?;

    let exported = match exported {
        Ok(Some(exported)) => exported,
        Ok(None) => return Ok(back_to_results(INVALID_FORMAT)),
        Err(e @ (ExportError::ReadPreview { .. } | ExportError::NoPages(_))) => {
            tracing::warn!(job_id = %job_id, error = %e, "Nothing to export");
            return Ok(back_to_results(FILE_NOT_FOUND));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        job_id = %job_id,
        file = %exported.filename,
        bytes = exported.bytes.len(),
        "Download ready"
    );

    Ok((
        [
            (header::CONTENT_TYPE, exported.media_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&exported.filename),
            ),
        ],
        exported.bytes,
    )
        .into_response())
}

fn back_to_results(message: &str) -> Response {
    Redirect::to("/results")
        .with_flash(Flash::danger(message))
        .into_response()
}

/// `attachment` disposition for `filename`.
///
/// The quoted name keeps printable ASCII only; anything else is replaced
/// and the exact name is carried in `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if fallback == filename {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(filename)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain() {
        assert_eq!(
            content_disposition("My Doc.final.txt"),
            "attachment; filename=\"My Doc.final.txt\""
        );
    }

    #[test]
    fn test_content_disposition_quotes_and_controls() {
        assert_eq!(
            content_disposition("a\"b\r\n.txt"),
            "attachment; filename=\"a_b__.txt\"; filename*=UTF-8''a%22b%0D%0A.txt"
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        let value = content_disposition("résumé.pdf");
        assert!(value.starts_with("attachment; filename=\"r_sum_.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"));
        assert!(axum::http::HeaderValue::from_str(&value).is_ok());
    }
}
