pub mod error;
pub mod runner;

pub use error::{FileError, PipelineError};
pub use runner::{BatchReport, BatchRunner, Upload, UploadOutcome};
