pub mod filesystem;
pub mod job_store;

pub use filesystem::UploadStorage;
pub use job_store::{JobId, JobStore, RESULTS_FILE};
