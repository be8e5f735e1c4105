pub mod loader;
pub mod schema;

pub use loader::{is_valid_language, load_config, load_config_from_str};
pub use schema::{
    Config, FileKind, LimitsConfig, OcrConfig, PdfExportLanguage, PreprocessConfig, ServerConfig,
    StorageConfig,
};
