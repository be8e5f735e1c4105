use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Failure while turning one uploaded file into a `FileResult`.
///
/// Fatal to that file, never to the batch it belongs to.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image: {0}")]
    ImageDecode(String),

    #[error("Failed to process PDF: {0}")]
    PdfProcessing(String),

    #[error("OCR failed: {0}")]
    OcrFailed(String),

    #[error("Failed to write preview '{path}': {source}")]
    WritePreview {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to build DOCX: {0}")]
    Docx(String),

    #[error("Failed to read preview image '{path}': {source}")]
    ReadPreview {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Searchable PDF rendering failed: {0}")]
    SearchablePdf(String),

    #[error("'{0}' has no pages to export")]
    NoPages(String),

    #[error("Failed to assemble PDF: {0}")]
    PdfAssembly(String),
}

/// Lookups that the web layer reports back to the user instead of failing.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Result file for job {job_id} is unreadable: {reason}")]
    CorruptResults { job_id: String, reason: String },

    #[error("File index {index} out of range for job {job_id} ({count} files)")]
    FileIndexOutOfRange {
        job_id: String,
        index: usize,
        count: usize,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}
