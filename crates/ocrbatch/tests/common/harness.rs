//! Test harness for isolated batch runs.
//!
//! `TestHarness` owns a temp directory laid out like a deployment
//! (uploads/processed/static), an in-memory audit database, and a
//! `BatchRunner` / `Exporter` pair wired to fake engines.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::GrayImage;
use tempfile::TempDir;

use ocrbatch::config::Config;
use ocrbatch::db::{upload_log_repo, Database, UploadLog};
use ocrbatch::error::{ExportError, ProcessError};
use ocrbatch::processor::{FileProcessor, OcrEngine, OcrOutput, OcrWord, PageRasterizer};
use ocrbatch::{BatchReport, BatchRunner, Exporter, Upload};

use super::builders::{pdf_with_labels, png_bytes};

/// Recognizes every page as `<width>x<height>` and records the language of
/// each call.
#[derive(Default)]
pub struct FakeEngine {
    pub languages: Mutex<Vec<String>>,
    pub pdf_languages: Mutex<Vec<String>>,
}

impl OcrEngine for FakeEngine {
    fn recognize(&self, image: &GrayImage, language: &str) -> Result<OcrOutput, ProcessError> {
        self.languages.lock().unwrap().push(language.to_string());
        let text = format!("{}x{}", image.width(), image.height());
        Ok(OcrOutput {
            words: vec![OcrWord {
                level: 5,
                page_num: 1,
                block_num: 1,
                par_num: 1,
                line_num: 1,
                word_num: 1,
                left: 0,
                top: 0,
                width: image.width() as i32,
                height: image.height() as i32,
                conf: 90.0,
                text: text.clone(),
            }],
            text,
        })
    }

    /// A one-page PDF labelled with the image's file name.
    fn searchable_pdf(&self, image_path: &Path, language: &str) -> Result<Vec<u8>, ExportError> {
        self.pdf_languages.lock().unwrap().push(language.to_string());
        if !image_path.is_file() {
            return Err(ExportError::SearchablePdf(format!(
                "missing {}",
                image_path.display()
            )));
        }
        let label = image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("page")
            .to_string();
        Ok(pdf_with_labels(&[label]))
    }
}

/// Counts pages with lopdf and renders page `n` as a `(20 + n) x 12` PNG.
pub struct FakeRasterizer;

impl PageRasterizer for FakeRasterizer {
    fn page_count(&self, pdf_path: &Path) -> Result<usize, ProcessError> {
        lopdf::Document::load(pdf_path)
            .map(|doc| doc.get_pages().len())
            .map_err(|e| ProcessError::PdfProcessing(format!("Failed to load PDF: {}", e)))
    }

    fn render_page(
        &self,
        _pdf_path: &Path,
        page_num: u32,
        _dpi: u32,
    ) -> Result<Vec<u8>, ProcessError> {
        Ok(png_bytes(20 + page_num, 12))
    }
}

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: Config,
    pub db: Database,
    pub engine: Arc<FakeEngine>,
    pub runner: BatchRunner,
    pub exporter: Exporter,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Like `new`, with `configure` applied to the config before anything
    /// is wired up.
    pub fn with_config(configure: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut config = Config::default();
        config.storage = config.storage.rebased(temp_dir.path());
        // Keep the denoise window small so tests stay fast.
        config.preprocess.patch_radius = 1;
        config.preprocess.search_radius = 1;
        configure(&mut config);

        let db = Database::open_in_memory().expect("Failed to open database");
        let engine = Arc::new(FakeEngine::default());
        let processor = FileProcessor::new(engine.clone(), Arc::new(FakeRasterizer), &config);
        let runner = BatchRunner::from_config(&config, processor, db.clone());
        let exporter = Exporter::new(engine.clone(), &config);

        Self {
            temp_dir,
            config,
            db,
            engine,
            runner,
            exporter,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn static_dir(&self) -> &Path {
        &self.config.storage.static_dir
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.storage.upload_dir
    }

    pub fn run(&self, uploads: Vec<Upload>, language: &str) -> BatchReport {
        self.runner
            .run(uploads, language)
            .expect("Batch should not fail")
    }

    pub fn audit_rows(&self) -> Vec<UploadLog> {
        upload_log_repo::list_all(&self.db).expect("Failed to list audit rows")
    }

    pub fn preview_path(&self, relative: &str) -> PathBuf {
        self.static_dir().join(relative)
    }
}
