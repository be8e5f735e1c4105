//! Download formats for a processed file.

pub mod docx;
pub mod pdf;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::schema::{Config, PdfExportLanguage};
use crate::error::ExportError;
use crate::processor::{FileResult, OcrEngine};
use crate::sanitize::file_stem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Docx,
    Pdf,
}

impl ExportFormat {
    /// Maps a download format tag to a format. Tags are matched exactly.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "txt" => Some(Self::Txt),
            "docx" => Some(Self::Docx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Txt => "text/plain",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Pdf => "application/pdf",
        }
    }
}

/// A rendered download.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    /// `<stem of original filename>.<extension>`
    pub filename: String,
}

impl ExportedFile {
    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }
}

/// Renders `FileResult`s into downloadable documents.
#[derive(Clone)]
pub struct Exporter {
    engine: Arc<dyn OcrEngine>,
    static_dir: PathBuf,
    default_language: String,
    pdf_language: PdfExportLanguage,
}

impl Exporter {
    pub fn new(engine: Arc<dyn OcrEngine>, config: &Config) -> Self {
        Self {
            engine,
            static_dir: config.storage.static_dir.clone(),
            default_language: config.ocr.default_language.clone(),
            pdf_language: config.ocr.pdf_export_language,
        }
    }

    /// Renders `result` in the format named by `tag`.
    ///
    /// An unknown tag is not an error: it yields `Ok(None)`.
    pub fn export(
        &self,
        result: &FileResult,
        tag: &str,
    ) -> Result<Option<ExportedFile>, ExportError> {
        match ExportFormat::parse(tag) {
            Some(format) => self.render(result, format).map(Some),
            None => {
                tracing::debug!(tag, "Unknown export format");
                Ok(None)
            }
        }
    }

    pub fn render(
        &self,
        result: &FileResult,
        format: ExportFormat,
    ) -> Result<ExportedFile, ExportError> {
        let _span = tracing::info_span!(
            "export.render",
            file = %result.filename,
            format = format.extension()
        )
        .entered();

        let bytes = match format {
            ExportFormat::Txt => result.full_text().into_bytes(),
            ExportFormat::Docx => docx::render_docx(
                &format!("OCR Result for {}", result.filename),
                &result.full_text(),
            )?,
            ExportFormat::Pdf => pdf::render_searchable_pdf(
                self.engine.as_ref(),
                &self.static_dir,
                result,
                self.searchable_pdf_language(result),
            )?,
        };

        Ok(ExportedFile {
            bytes,
            format,
            filename: download_filename(result, format),
        })
    }

    /// Language handed to the engine for searchable-PDF output.
    pub fn searchable_pdf_language<'a>(&'a self, result: &'a FileResult) -> &'a str {
        match self.pdf_language {
            PdfExportLanguage::Job => result
                .language
                .as_deref()
                .unwrap_or(&self.default_language),
            PdfExportLanguage::Default => &self.default_language,
        }
    }
}

/// Download name: the original filename's stem plus the format extension.
pub fn download_filename(result: &FileResult, format: ExportFormat) -> String {
    format!(
        "{}.{}",
        file_stem(&result.original_filename),
        format.extension()
    )
}
