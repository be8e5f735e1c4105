//! Application state shared by all handlers.

use std::sync::Arc;

use ocrbatch::processor::{FileProcessor, OcrEngine, PageRasterizer};
use ocrbatch::{BatchRunner, Config, Database, Exporter, JobStore};

/// Cheaply cloneable handle to everything a request needs.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    db: Database,
    runner: BatchRunner,
    exporter: Exporter,
}

impl AppState {
    /// Wires the pipeline with the given OCR engine and PDF rasterizer.
    pub fn new(
        config: Config,
        db: Database,
        engine: Arc<dyn OcrEngine>,
        rasterizer: Arc<dyn PageRasterizer>,
    ) -> Self {
        let processor = FileProcessor::new(Arc::clone(&engine), rasterizer, &config);
        Self::from_processor(config, db, processor, engine)
    }

    /// Production wiring: Tesseract plus poppler-utils.
    pub fn with_defaults(config: Config, db: Database) -> Self {
        let processor = FileProcessor::with_defaults(&config);
        let engine = processor.engine();
        Self::from_processor(config, db, processor, engine)
    }

    fn from_processor(
        config: Config,
        db: Database,
        processor: FileProcessor,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        let runner = BatchRunner::from_config(&config, processor, db.clone());
        let exporter = Exporter::new(engine, &config);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                runner,
                exporter,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    pub fn runner(&self) -> &BatchRunner {
        &self.inner.runner
    }

    pub fn jobs(&self) -> &JobStore {
        self.inner.runner.jobs()
    }

    pub fn exporter(&self) -> &Exporter {
        &self.inner.exporter
    }
}
