use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Move a file from `src` to `dst`. Uses `rename` first (atomic on the same
/// filesystem) and falls back to copy + delete when rename fails, which covers
/// cross-device moves.
pub(crate) fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

pub(crate) fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Raw upload storage, one subdirectory per job.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    upload_dir: PathBuf,
}

impl UploadStorage {
    pub fn new<P: AsRef<Path>>(upload_dir: P) -> Self {
        Self {
            upload_dir: upload_dir.as_ref().to_path_buf(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Saves `content` as `<upload_dir>/<job_id>/<filename>`.
    ///
    /// An existing file is never overwritten: a second upload with the same
    /// name in the same job is stored as `name_2.ext`, then `name_3.ext`, and
    /// so on.
    pub fn save(
        &self,
        job_id: &str,
        filename: &str,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let dir_path = self.upload_dir.join(job_id);
        ensure_directory(&dir_path)?;

        let (base, ext) = match filename.rfind('.') {
            Some(dot_pos) => (&filename[..dot_pos], Some(&filename[dot_pos..])),
            None => (filename, None),
        };

        for counter in 1..=1000 {
            let try_filename = if counter == 1 {
                filename.to_string()
            } else {
                match ext {
                    Some(ext) => format!("{}_{}{}", base, counter, ext),
                    None => format!("{}_{}", base, counter),
                }
            };

            let try_path = dir_path.join(&try_filename);

            // create_new is an atomic check-and-create
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&try_path)
            {
                Ok(mut file) => {
                    file.write_all(content)
                        .map_err(|e| StorageError::WriteFile {
                            path: try_path.clone(),
                            source: e,
                        })?;
                    return Ok(try_path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: try_path,
                        source: e,
                    });
                }
            }
        }

        Err(StorageError::FileExists(dir_path.join(filename)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_creates_job_directory() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());

        let path = storage.save("job-1", "scan.png", b"image").unwrap();
        assert_eq!(path, temp.path().join("job-1").join("scan.png"));
        assert_eq!(std::fs::read(&path).unwrap(), b"image");
    }

    #[test]
    fn test_save_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());

        let first = storage.save("job-1", "scan.png", b"one").unwrap();
        let second = storage.save("job-1", "scan.png", b"two").unwrap();
        let third = storage.save("job-1", "scan.png", b"three").unwrap();

        assert_eq!(first.file_name().unwrap(), "scan.png");
        assert_eq!(second.file_name().unwrap(), "scan_2.png");
        assert_eq!(third.file_name().unwrap(), "scan_3.png");
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
    }

    #[test]
    fn test_save_without_extension() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());

        storage.save("job-1", "README", b"a").unwrap();
        let second = storage.save("job-1", "README", b"b").unwrap();
        assert_eq!(second.file_name().unwrap(), "README_2");
    }

    #[test]
    fn test_jobs_are_isolated() {
        let temp = TempDir::new().unwrap();
        let storage = UploadStorage::new(temp.path());

        let a = storage.save("job-a", "scan.png", b"a").unwrap();
        let b = storage.save("job-b", "scan.png", b"b").unwrap();
        assert_eq!(a.file_name(), b.file_name());
        assert_ne!(a.parent(), b.parent());
    }

    #[test]
    fn test_move_file_same_filesystem() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("a.tmp");
        let dst = temp.path().join("a.json");
        std::fs::write(&src, b"{}").unwrap();

        move_file(&src, &dst).unwrap();
        assert!(!src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"{}");
    }

    #[test]
    fn test_move_file_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = move_file(&temp.path().join("missing"), &temp.path().join("dst"));
        assert!(matches!(result, Err(StorageError::MoveFile { .. })));
    }
}
