use thiserror::Error;

/// Failures that stop a whole batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Job storage failed: {0}")]
    Storage(#[from] crate::error::StorageError),

    #[error("Audit log failed: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

/// Failure of a single file. Recorded against that file only.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Save(#[from] crate::error::StorageError),

    #[error(transparent)]
    Process(#[from] crate::error::ProcessError),
}
