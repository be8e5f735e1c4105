pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod storage;

pub use config::{load_config, Config, FileKind};
pub use db::{Database, DatabaseError, UploadLog};
pub use error::{ConfigError, ExportError, LookupError, ProcessError, StorageError};
pub use export::{ExportFormat, ExportedFile, Exporter};
pub use pipeline::{BatchReport, BatchRunner, PipelineError, Upload, UploadOutcome};
pub use processor::{
    FileProcessor, FileResult, OcrEngine, OcrOutput, OcrWord, PageRasterizer, PageResult,
};
pub use storage::{JobId, JobStore};
