use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Subdirectory of the static root that holds per-job preview images.
pub const PREVIEW_SUBDIR: &str = "processed";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Where raw uploads are saved, one subdirectory per job.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Where job directories holding `results.json` live.
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    /// Publicly served directory; previews go under `<static_dir>/processed`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("processed")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Returns the default audit database path: `<data dir>/ocrbatch/ocrbatch.db`,
/// or `ocrbatch.db` in the working directory when no data dir is known.
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ocrbatch").join("ocrbatch.db"))
        .unwrap_or_else(|| PathBuf::from("ocrbatch.db"))
}

impl StorageConfig {
    /// Root directory for preview images.
    pub fn preview_root(&self) -> PathBuf {
        self.static_dir.join(PREVIEW_SUBDIR)
    }

    /// Rebases all relative paths onto `base`.
    pub fn rebased(&self, base: &Path) -> Self {
        let rebase = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        Self {
            upload_dir: rebase(&self.upload_dir),
            processed_dir: rebase(&self.processed_dir),
            static_dir: rebase(&self.static_dir),
            database_path: rebase(&self.database_path),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            processed_dir: default_processed_dir(),
            static_dir: default_static_dir(),
            database_path: default_database_path(),
        }
    }
}

/// Which language the searchable-PDF export runs the engine with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfExportLanguage {
    /// The language the file was originally processed with.
    #[default]
    Job,
    /// Always `OcrConfig::default_language`.
    Default,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Rasterization resolution for PDF pages.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default)]
    pub pdf_export_language: PdfExportLanguage,
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_dpi() -> u32 {
    200
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            dpi: default_dpi(),
            pdf_export_language: PdfExportLanguage::default(),
        }
    }
}

/// Non-local-means denoising parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Filter strength `h`; larger values smooth more.
    #[serde(default = "default_denoise_strength")]
    pub denoise_strength: f32,
    /// Half-size of the comparison patch (3 → 7×7).
    #[serde(default = "default_patch_radius")]
    pub patch_radius: u32,
    /// Half-size of the search window around each pixel.
    #[serde(default = "default_search_radius")]
    pub search_radius: u32,
}

fn default_denoise_strength() -> f32 {
    30.0
}

fn default_patch_radius() -> u32 {
    3
}

fn default_search_radius() -> u32 {
    5
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            denoise_strength: default_denoise_strength(),
            patch_radius: default_patch_radius(),
            search_radius: default_search_radius(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Largest width or height, in pixels, of a decoded page. Denoising
    /// memory grows with the pixel count, so larger bitmaps fail the file.
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
}

fn default_max_upload_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_max_image_dimension() -> u32 {
    8000
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            max_image_dimension: default_max_image_dimension(),
        }
    }
}

/// Upload types the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Image,
    Pdf,
}

impl FileKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Classifies a filename by its last extension, case-insensitively.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}
