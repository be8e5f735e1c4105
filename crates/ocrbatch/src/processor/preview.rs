use std::path::{Path, PathBuf};

use crate::config::schema::PREVIEW_SUBDIR;
use crate::error::ProcessError;

/// Preview directory owned by one processed file.
///
/// Previews live at `<preview_root>/<job_id>/<file key>/`, so two files of
/// the same job never share a preview path whatever their names. Files
/// written here are referenced from `PageResult::preview_image` by a
/// `/`-separated path relative to the static root.
#[derive(Debug, Clone)]
pub struct PreviewDir {
    dir: PathBuf,
    relative: String,
}

impl PreviewDir {
    /// Creates a fresh directory for `filename` inside the job's preview
    /// directory. A directory left by an earlier file of the same name is
    /// never reused: the key becomes `name_2`, then `name_3`, and so on.
    pub fn create(
        preview_root: &Path,
        job_id: &str,
        filename: &str,
    ) -> Result<Self, ProcessError> {
        let job_dir = preview_root.join(job_id);
        std::fs::create_dir_all(&job_dir).map_err(|e| ProcessError::WritePreview {
            path: job_dir.clone(),
            source: e,
        })?;

        for counter in 1..=1000 {
            let key = if counter == 1 {
                filename.to_string()
            } else {
                format!("{}_{}", filename, counter)
            };
            let dir = job_dir.join(&key);

            // create_dir fails on an existing directory, which claims the key atomically
            match std::fs::create_dir(&dir) {
                Ok(()) => {
                    return Ok(Self {
                        dir,
                        relative: format!("{}/{}/{}", PREVIEW_SUBDIR, job_id, key),
                    });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ProcessError::WritePreview { path: dir, source: e }),
            }
        }

        Err(ProcessError::WritePreview {
            path: job_dir.join(filename),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free preview directory",
            ),
        })
    }

    /// Writes `bytes` as `name` and returns the static-relative path.
    pub fn write(&self, name: &str, bytes: &[u8]) -> Result<String, ProcessError> {
        let path = self.dir.join(name);
        std::fs::write(&path, bytes).map_err(|e| ProcessError::WritePreview {
            path: path.clone(),
            source: e,
        })?;
        Ok(format!("{}/{}", self.relative, name))
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}
