use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ProcessError;
use crate::processor::preview::PreviewDir;
use crate::processor::result::PageResult;
use crate::processor::FileProcessor;
use crate::sanitize::redact_path;

impl FileProcessor {
    /// PDF branch: every page is rasterized, recognized and previewed as PNG.
    pub(crate) fn process_pdf(
        &self,
        path: &Path,
        filename: &str,
        previews: &PreviewDir,
        language: &str,
    ) -> Result<Vec<PageResult>, ProcessError> {
        let _span = tracing::info_span!("processor.pdf").entered();

        if !path.is_file() {
            return Err(ProcessError::ReadFile {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        let page_count = self.rasterizer.page_count(path)?;
        tracing::debug!(page_count, "PDF page count");

        let mut pages = Vec::with_capacity(page_count);

        for page_num in 1..=page_count as u32 {
            let png = self.rasterizer.render_page(path, page_num, self.dpi)?;

            let decoded =
                self.decode_page(&png, &format!("page {} of {}", page_num, filename))?;

            let output = self.recognize_page(&decoded, language)?;

            let preview_image =
                previews.write(&format!("preview_page_{}.png", page_num), &png)?;

            pages.push(PageResult {
                page_num,
                text: output.text,
                ocr_data: output.words,
                preview_image,
            });
        }

        Ok(pages)
    }
}

/// Turns PDF pages into bitmaps.
pub trait PageRasterizer: Send + Sync {
    fn page_count(&self, pdf_path: &Path) -> Result<usize, ProcessError>;

    /// Renders one 1-based page and returns the PNG bytes.
    fn render_page(&self, pdf_path: &Path, page_num: u32, dpi: u32)
        -> Result<Vec<u8>, ProcessError>;
}

/// Rasterizer backed by poppler-utils (`pdftoppm`, `pdfinfo`).
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    pdftoppm: PathBuf,
    pdfinfo: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new() -> Self {
        Self {
            pdftoppm: PathBuf::from("pdftoppm"),
            pdfinfo: PathBuf::from("pdfinfo"),
        }
    }

    /// Uses explicit poppler binaries instead of looking them up on `PATH`.
    pub fn with_binaries(pdftoppm: impl Into<PathBuf>, pdfinfo: impl Into<PathBuf>) -> Self {
        Self {
            pdftoppm: pdftoppm.into(),
            pdfinfo: pdfinfo.into(),
        }
    }

    /// Get the page count of a PDF using pdfinfo.
    /// Used as fallback when lopdf can't parse the PDF structure.
    fn count_with_pdfinfo(&self, pdf_path: &Path) -> Result<usize, ProcessError> {
        let output = Command::new(&self.pdfinfo)
            .arg(pdf_path)
            .output()
            .map_err(|e| {
                ProcessError::PdfProcessing(format!(
                    "Failed to run pdfinfo: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProcessError::PdfProcessing(format!(
                "pdfinfo failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        parse_pdfinfo_pages(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            ProcessError::PdfProcessing("pdfinfo did not report a page count".to_string())
        })
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for PdftoppmRasterizer {
    fn page_count(&self, pdf_path: &Path) -> Result<usize, ProcessError> {
        match lopdf::Document::load(pdf_path) {
            Ok(doc) => Ok(doc.get_pages().len()),
            Err(e) => {
                // lopdf rejects some PDFs poppler still handles (e.g. broken xref tables).
                tracing::warn!(
                    "lopdf failed to parse {}: {}. Falling back to pdfinfo.",
                    redact_path(pdf_path),
                    e
                );
                self.count_with_pdfinfo(pdf_path)
            }
        }
    }

    fn render_page(
        &self,
        pdf_path: &Path,
        page_num: u32,
        dpi: u32,
    ) -> Result<Vec<u8>, ProcessError> {
        let _span = tracing::info_span!("processor.rasterize", page = page_num, dpi).entered();

        // Dropped (and removed) on every return path.
        let work_dir = tempfile::Builder::new()
            .prefix("ocrbatch_page_")
            .tempdir()
            .map_err(|e| {
                ProcessError::PdfProcessing(format!("Failed to create temp directory: {}", e))
            })?;
        let output_prefix = work_dir.path().join("page");

        let output = Command::new(&self.pdftoppm)
            .arg("-png")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &page_num.to_string()])
            .args(["-l", &page_num.to_string()])
            .arg(pdf_path)
            .arg(&output_prefix)
            .output()
            .map_err(|e| {
                ProcessError::PdfProcessing(format!(
                    "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ProcessError::PdfProcessing(format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        // pdftoppm zero-pads the page suffix to the width of the page count
        let image_path = [
            format!("page-{}.png", page_num),
            format!("page-{:02}.png", page_num),
            format!("page-{:03}.png", page_num),
            format!("page-{:04}.png", page_num),
        ]
        .iter()
        .map(|name| work_dir.path().join(name))
        .find(|p| p.exists())
        .ok_or_else(|| {
            ProcessError::PdfProcessing(format!("Failed to find rendered image for page {}", page_num))
        })?;

        std::fs::read(&image_path).map_err(|e| {
            ProcessError::PdfProcessing(format!("Failed to read rendered image: {}", e))
        })
    }
}

/// Extracts the `Pages:` value from pdfinfo output.
fn parse_pdfinfo_pages(stdout: &str) -> Option<usize> {
    stdout.lines().find_map(|line| {
        line.strip_prefix("Pages:")
            .and_then(|count| count.trim().parse::<usize>().ok())
    })
}
