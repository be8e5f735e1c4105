use std::io::Cursor;
use std::path::Path;
use std::process::Command;

use image::GrayImage;

use crate::error::{ExportError, ProcessError};
use crate::processor::result::OcrWord;
use crate::sanitize::redact_path;

/// Text and word-level data recognized on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    pub text: String,
    pub words: Vec<OcrWord>,
}

/// The recognition engine seam.
///
/// Implementations must be shareable across the blocking worker threads the
/// web layer runs batches on.
pub trait OcrEngine: Send + Sync {
    /// Recognizes a preprocessed page bitmap.
    fn recognize(&self, image: &GrayImage, language: &str) -> Result<OcrOutput, ProcessError>;

    /// Renders the image file at `image_path` as a single-page PDF with an
    /// invisible text layer.
    fn searchable_pdf(&self, image_path: &Path, language: &str) -> Result<Vec<u8>, ExportError>;
}

/// Tesseract through leptess for recognition and through the `tesseract`
/// binary for PDF output.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
}

impl TesseractEngine {
    pub fn new() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }

    /// Uses a specific `tesseract` executable for searchable-PDF output.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage, language: &str) -> Result<OcrOutput, ProcessError> {
        let _span = tracing::info_span!("processor.ocr", language).entered();

        // leptess takes encoded image bytes
        let mut png_data = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to encode page: {}", e)))?;

        let mut lt = leptess::LepTess::new(None, language).map_err(|e| {
            ProcessError::OcrFailed(format!("Failed to initialize Tesseract: {}", e))
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ProcessError::OcrFailed(format!("Failed to set image for OCR: {}", e)))?;

        let tsv = lt
            .get_tsv_text(0)
            .map_err(|e| ProcessError::OcrFailed(format!("OCR failed: {}", e)))?;

        let words = parse_tsv(&tsv);
        let text = join_word_text(&words);
        tracing::debug!(rows = words.len(), chars = text.len(), "Page recognized");

        Ok(OcrOutput { text, words })
    }

    fn searchable_pdf(&self, image_path: &Path, language: &str) -> Result<Vec<u8>, ExportError> {
        let _span = tracing::info_span!(
            "export.searchable_pdf",
            image = %redact_path(image_path),
            language
        )
        .entered();

        let output = Command::new(&self.binary)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", language, "pdf"])
            .output()
            .map_err(|e| {
                ExportError::SearchablePdf(format!(
                    "Failed to run {}: {}. Make sure tesseract is installed.",
                    self.binary, e
                ))
            })?;

        if !output.status.success() {
            return Err(ExportError::SearchablePdf(format!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        if output.stdout.is_empty() {
            return Err(ExportError::SearchablePdf(
                "tesseract produced no output".to_string(),
            ));
        }

        Ok(output.stdout)
    }
}

/// Parses Tesseract TSV output into rows.
///
/// A header line, if present, is skipped, as are lines that do not have the
/// twelve expected columns.
pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    tsv.lines().filter_map(parse_tsv_line).collect()
}

fn parse_tsv_line(line: &str) -> Option<OcrWord> {
    let fields: Vec<&str> = line.splitn(12, '\t').collect();
    if fields.len() < 11 {
        return None;
    }

    Some(OcrWord {
        level: fields[0].trim().parse().ok()?,
        page_num: fields[1].trim().parse().ok()?,
        block_num: fields[2].trim().parse().ok()?,
        par_num: fields[3].trim().parse().ok()?,
        line_num: fields[4].trim().parse().ok()?,
        word_num: fields[5].trim().parse().ok()?,
        left: fields[6].trim().parse().ok()?,
        top: fields[7].trim().parse().ok()?,
        width: fields[8].trim().parse().ok()?,
        height: fields[9].trim().parse().ok()?,
        conf: fields[10].trim().parse().ok()?,
        text: fields
            .get(11)
            .map(|t| t.trim_end_matches(['\r', '\n']).to_string())
            .unwrap_or_default(),
    })
}

/// Non-empty token texts joined with single spaces.
pub fn join_word_text(words: &[OcrWord]) -> String {
    words
        .iter()
        .map(|w| w.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
