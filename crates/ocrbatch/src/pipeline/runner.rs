use std::path::Path;

use tracing::{info_span, warn};

use crate::config::schema::{Config, FileKind};
use crate::db::{upload_log_repo, Database};
use crate::processor::{FileProcessor, FileResult};
use crate::sanitize::secure_filename;
use crate::storage::{JobId, JobStore, UploadStorage};

use super::error::{FileError, PipelineError};

/// One uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-supplied name; may contain directories or unsafe characters.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// The client name without any directory part.
    pub fn display_name(&self) -> &str {
        self.filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.filename)
    }
}

/// What happened to one upload of a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Processed { filename: String, pages: usize },
    Failed { filename: String, error: String },
    /// Not on the allow-list: never saved, processed or audited.
    Rejected { filename: String },
}

impl UploadOutcome {
    pub fn filename(&self) -> &str {
        match self {
            Self::Processed { filename, .. }
            | Self::Failed { filename, .. }
            | Self::Rejected { filename } => filename,
        }
    }
}

/// Result of one batch: per-upload outcomes in upload order, and the
/// successful FileResults as written to the job's ResultSet.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub job_id: JobId,
    pub outcomes: Vec<UploadOutcome>,
    pub results: Vec<FileResult>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UploadOutcome::Failed { .. }))
    }

    pub fn rejections(&self) -> impl Iterator<Item = &UploadOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, UploadOutcome::Rejected { .. }))
    }
}

/// Drives a batch of uploads through saving, auditing and processing.
///
/// Files are handled one at a time, in order. A failing file is recorded and
/// the batch moves on; only storage or audit-log failures abort the batch.
#[derive(Clone)]
pub struct BatchRunner {
    processor: FileProcessor,
    uploads: UploadStorage,
    jobs: JobStore,
    db: Database,
}

impl BatchRunner {
    pub fn new(
        processor: FileProcessor,
        uploads: UploadStorage,
        jobs: JobStore,
        db: Database,
    ) -> Self {
        Self {
            processor,
            uploads,
            jobs,
            db,
        }
    }

    /// Wires upload and job storage from the config's storage section.
    pub fn from_config(config: &Config, processor: FileProcessor, db: Database) -> Self {
        Self::new(
            processor,
            UploadStorage::new(&config.storage.upload_dir),
            JobStore::new(&config.storage.processed_dir),
            db,
        )
    }

    pub fn jobs(&self) -> &JobStore {
        &self.jobs
    }

    /// Processes `uploads` as one job using OCR `language`.
    ///
    /// The ResultSet is written even when every file failed or was rejected.
    pub fn run(&self, uploads: Vec<Upload>, language: &str) -> Result<BatchReport, PipelineError> {
        let job_id = self.jobs.create_job()?;
        let _span = info_span!("pipeline.batch", job_id = %job_id, files = uploads.len(), language)
            .entered();

        let mut outcomes = Vec::with_capacity(uploads.len());
        let mut results = Vec::new();

        for upload in &uploads {
            let display_name = upload.display_name().to_string();

            let Some(kind) = FileKind::from_filename(&upload.filename) else {
                warn!(file = %display_name, "File type not allowed");
                outcomes.push(UploadOutcome::Rejected {
                    filename: display_name,
                });
                continue;
            };

            let stored_name = stored_filename(&upload.filename, kind);
            let (saved_name, outcome) =
                self.run_one(&job_id, upload, &stored_name, language)?;

            match outcome {
                Ok(result) => {
                    outcomes.push(UploadOutcome::Processed {
                        filename: display_name.clone(),
                        pages: result.page_count,
                    });
                    results.push(result.with_original_filename(display_name));
                }
                Err(e) => {
                    warn!(file = %saved_name, error = %e, "File failed");
                    outcomes.push(UploadOutcome::Failed {
                        filename: display_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        {
            let _step = info_span!("write_results").entered();
            self.jobs.write_results(&job_id, &results)?;
        }

        Ok(BatchReport {
            job_id,
            outcomes,
            results,
        })
    }

    /// Saves, audits and processes one accepted upload.
    ///
    /// The outer `Result` is batch-fatal; the inner one is this file's outcome.
    #[allow(clippy::type_complexity)]
    fn run_one(
        &self,
        job_id: &JobId,
        upload: &Upload,
        stored_name: &str,
        language: &str,
    ) -> Result<(String, Result<FileResult, FileError>), PipelineError> {
        let saved = self
            .uploads
            .save(&job_id.to_string(), stored_name, &upload.bytes);

        let saved_name = match &saved {
            Ok(path) => file_name(path).unwrap_or_else(|| stored_name.to_string()),
            Err(_) => stored_name.to_string(),
        };
        let _span = info_span!("pipeline.file", file = %saved_name).entered();

        let log = upload_log_repo::insert(&self.db, &saved_name, language)?;

        let outcome = saved.map_err(FileError::from).and_then(|path| {
            self.processor
                .process(&path, &job_id.to_string(), language)
                .map_err(FileError::from)
        });

        match &outcome {
            Ok(result) => upload_log_repo::mark_complete(&self.db, log.id, result.page_count)?,
            Err(e) => upload_log_repo::mark_failed(&self.db, log.id, &e.to_string())?,
        }

        Ok((saved_name, outcome))
    }
}

/// Safe on-disk name for an allow-listed upload. Falls back to
/// `upload.<ext>` when sanitizing leaves nothing usable.
fn stored_filename(raw: &str, kind: FileKind) -> String {
    match secure_filename(raw) {
        Some(name) if FileKind::from_filename(&name) == Some(kind) => name,
        _ => {
            let ext = raw
                .rsplit_once('.')
                .map(|(_, e)| e.to_ascii_lowercase())
                .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or_else(|| match kind {
                    FileKind::Image => "png".to_string(),
                    FileKind::Pdf => "pdf".to_string(),
                });
            format!("upload.{}", ext)
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}
