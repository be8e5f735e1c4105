pub mod image;
pub mod ocr;
pub mod pdf;
pub mod preprocess;
pub mod preview;
pub mod result;

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::image::{DynamicImage, ImageReader, Limits};

use crate::config::schema::{Config, FileKind, PreprocessConfig};
use crate::error::ProcessError;
use crate::sanitize::redact_path;

pub use ocr::{OcrEngine, OcrOutput, TesseractEngine};
pub use pdf::{PageRasterizer, PdftoppmRasterizer};
pub use preview::PreviewDir;
pub use result::{FileResult, OcrWord, PageResult};

/// Turns one saved upload into a `FileResult`, writing preview images for
/// every page along the way.
#[derive(Clone)]
pub struct FileProcessor {
    engine: Arc<dyn OcrEngine>,
    rasterizer: Arc<dyn PageRasterizer>,
    preprocess: PreprocessConfig,
    dpi: u32,
    max_image_dimension: u32,
    preview_root: PathBuf,
}

impl FileProcessor {
    pub fn new(
        engine: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PageRasterizer>,
        config: &Config,
    ) -> Self {
        Self {
            engine,
            rasterizer,
            preprocess: config.preprocess,
            dpi: config.ocr.dpi,
            max_image_dimension: config.limits.max_image_dimension,
            preview_root: config.storage.preview_root(),
        }
    }

    /// Production setup: Tesseract and poppler-utils.
    pub fn with_defaults(config: &Config) -> Self {
        Self::new(
            Arc::new(TesseractEngine::new()),
            Arc::new(PdftoppmRasterizer::new()),
            config,
        )
    }

    pub fn engine(&self) -> Arc<dyn OcrEngine> {
        Arc::clone(&self.engine)
    }

    /// Processes the file at `path` for `job_id` using `language`.
    ///
    /// The file's kind is taken from its extension; pages are numbered from
    /// 1 in physical order.
    pub fn process(
        &self,
        path: &Path,
        job_id: &str,
        language: &str,
    ) -> Result<FileResult, ProcessError> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ProcessError::UnsupportedFormat(redact_path(path)))?
            .to_string();

        let kind = FileKind::from_filename(&filename).ok_or_else(|| {
            let ext = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
            ProcessError::UnsupportedFormat(ext.to_string())
        })?;

        let _span = tracing::info_span!(
            "processor.file",
            file = %filename,
            kind = ?kind,
            language
        )
        .entered();

        let previews = PreviewDir::create(&self.preview_root, job_id, &filename)?;

        let pages = match kind {
            FileKind::Image => self.process_image(path, &filename, &previews, language)?,
            FileKind::Pdf => self.process_pdf(path, &filename, &previews, language)?,
        };

        tracing::info!(pages = pages.len(), "File processed");

        Ok(FileResult::new(filename, language, pages))
    }

    /// Decodes an image or rendered page, refusing bitmaps wider or taller
    /// than `limits.max_image_dimension` before any pixel buffer is allocated.
    fn decode_page(&self, bytes: &[u8], label: &str) -> Result<DynamicImage, ProcessError> {
        let decode_error = |e: &dyn std::fmt::Display| {
            ProcessError::ImageDecode(format!("{}: {}", label, e))
        };

        let mut reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| decode_error(&e))?;

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.max_image_dimension);
        limits.max_image_height = Some(self.max_image_dimension);
        reader.limits(limits);

        reader.decode().map_err(|e| decode_error(&e))
    }

    /// Preprocesses a decoded page and runs it through the engine.
    fn recognize_page(
        &self,
        page: &DynamicImage,
        language: &str,
    ) -> Result<ocr::OcrOutput, ProcessError> {
        let prepared = preprocess::preprocess_image(page, &self.preprocess);
        self.engine.recognize(&prepared, language)
    }
}
