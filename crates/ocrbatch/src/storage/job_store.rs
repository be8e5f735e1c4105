use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{LookupError, StorageError};
use crate::processor::FileResult;
use crate::storage::filesystem::{ensure_directory, move_file};

/// Name of the ResultSet document inside a job directory.
pub const RESULTS_FILE: &str = "results.json";

/// Identifier of one upload batch: a random (v4) UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a user-supplied id. Only UUIDs are accepted, so a parsed id is
    /// always safe to join onto a directory.
    pub fn parse(input: &str) -> Result<Self, LookupError> {
        Uuid::parse_str(input.trim())
            .map(Self)
            .map_err(|_| LookupError::InvalidJobId(input.to_string()))
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Per-job directories under the processed root, each holding one
/// `results.json`.
#[derive(Debug, Clone)]
pub struct JobStore {
    processed_dir: PathBuf,
}

impl JobStore {
    pub fn new<P: AsRef<Path>>(processed_dir: P) -> Self {
        Self {
            processed_dir: processed_dir.as_ref().to_path_buf(),
        }
    }

    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.processed_dir.join(job_id.to_string())
    }

    /// Allocates a new job id and creates its directory.
    pub fn create_job(&self) -> Result<JobId, StorageError> {
        let job_id = JobId::new();
        ensure_directory(&self.job_dir(&job_id))?;
        tracing::debug!(job_id = %job_id, "Job directory created");
        Ok(job_id)
    }

    /// Writes the ResultSet for `job_id`.
    ///
    /// The document is written to a temporary file in the job directory and
    /// renamed into place, so readers never see a partial file.
    pub fn write_results(
        &self,
        job_id: &JobId,
        results: &[FileResult],
    ) -> Result<PathBuf, StorageError> {
        let dir = self.job_dir(job_id);
        ensure_directory(&dir)?;

        let json = serde_json::to_vec(results)?;

        let tmp_path = dir.join(format!(".{}.{}.tmp", RESULTS_FILE, Uuid::new_v4().simple()));
        let final_path = dir.join(RESULTS_FILE);

        let mut file = std::fs::File::create(&tmp_path).map_err(|e| StorageError::WriteFile {
            path: tmp_path.clone(),
            source: e,
        })?;
        file.write_all(&json)
            .and_then(|_| file.sync_all())
            .map_err(|e| StorageError::WriteFile {
                path: tmp_path.clone(),
                source: e,
            })?;
        drop(file);

        if let Err(e) = move_file(&tmp_path, &final_path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }

        tracing::info!(job_id = %job_id, files = results.len(), "Results written");
        Ok(final_path)
    }

    /// Reads the ResultSet for a user-supplied job id.
    pub fn read_results(&self, job_id: &str) -> Result<Vec<FileResult>, LookupError> {
        let id = JobId::parse(job_id)?;
        let path = self.job_dir(&id).join(RESULTS_FILE);

        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LookupError::JobNotFound(id.to_string()));
            }
            Err(e) => {
                return Err(LookupError::CorruptResults {
                    job_id: id.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        serde_json::from_slice(&content).map_err(|e| LookupError::CorruptResults {
            job_id: id.to_string(),
            reason: e.to_string(),
        })
    }

    /// One FileResult of a job, by its position in the ResultSet.
    pub fn file_result(&self, job_id: &str, index: usize) -> Result<FileResult, LookupError> {
        let mut results = self.read_results(job_id)?;
        let count = results.len();
        if index >= count {
            return Err(LookupError::FileIndexOutOfRange {
                job_id: job_id.to_string(),
                index,
                count,
            });
        }
        Ok(results.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::PageResult;
    use tempfile::TempDir;

    fn result(name: &str, texts: &[&str]) -> FileResult {
        let pages = texts
            .iter()
            .enumerate()
            .map(|(i, text)| PageResult {
                page_num: i as u32 + 1,
                text: text.to_string(),
                ocr_data: vec![],
                preview_image: format!("processed/job/preview_{}_{}", i + 1, name),
            })
            .collect();
        FileResult::new(name, "eng", pages)
    }

    #[test]
    fn test_create_job_makes_directory() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());

        let job_id = store.create_job().unwrap();
        assert!(store.job_dir(&job_id).is_dir());
        assert_eq!(job_id.to_string().len(), 36);
    }

    #[test]
    fn test_job_ids_are_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_write_then_read_results() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());
        let job_id = store.create_job().unwrap();

        let results = vec![result("a.png", &["A"]), result("b.pdf", &["B1", "B2"])];
        let path = store.write_results(&job_id, &results).unwrap();
        assert_eq!(path.file_name().unwrap(), RESULTS_FILE);

        let read = store.read_results(&job_id.to_string()).unwrap();
        assert_eq!(read, results);
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());
        let job_id = store.create_job().unwrap();

        store.write_results(&job_id, &[]).unwrap();
        store.write_results(&job_id, &[result("a.png", &["A"])]).unwrap();

        let entries: Vec<_> = std::fs::read_dir(store.job_dir(&job_id))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec![RESULTS_FILE.to_string()]);
    }

    #[test]
    fn test_empty_result_set() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());
        let job_id = store.create_job().unwrap();

        store.write_results(&job_id, &[]).unwrap();
        assert!(store.read_results(&job_id.to_string()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_job() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());

        let result = store.read_results(&JobId::new().to_string());
        assert!(matches!(result, Err(LookupError::JobNotFound(_))));
    }

    #[test]
    fn test_invalid_job_id_is_rejected() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());

        for bad in ["../etc", "", "not-a-uuid", "../../results"] {
            let result = store.read_results(bad);
            assert!(
                matches!(result, Err(LookupError::InvalidJobId(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_corrupt_results() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());
        let job_id = store.create_job().unwrap();
        std::fs::write(store.job_dir(&job_id).join(RESULTS_FILE), b"{ truncated").unwrap();

        let result = store.read_results(&job_id.to_string());
        assert!(matches!(result, Err(LookupError::CorruptResults { .. })));
    }

    #[test]
    fn test_file_result_by_index() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());
        let job_id = store.create_job().unwrap();
        store
            .write_results(&job_id, &[result("a.png", &["A"]), result("b.png", &["B"])])
            .unwrap();

        let second = store.file_result(&job_id.to_string(), 1).unwrap();
        assert_eq!(second.filename, "b.png");

        match store.file_result(&job_id.to_string(), 2) {
            Err(LookupError::FileIndexOutOfRange { index, count, .. }) => {
                assert_eq!((index, count), (2, 2));
            }
            other => panic!("Expected FileIndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_uppercase_job_id_maps_to_same_directory() {
        let temp = TempDir::new().unwrap();
        let store = JobStore::new(temp.path());
        let job_id = store.create_job().unwrap();
        store.write_results(&job_id, &[result("a.png", &["A"])]).unwrap();

        let upper = job_id.to_string().to_uppercase();
        assert_eq!(store.read_results(&upper).unwrap().len(), 1);
    }
}
