use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// Returns true for engine language codes such as `eng`, `deu+eng` or `chi_sim`.
///
/// The code ends up as a command-line argument, so anything else is refused.
pub fn is_valid_language(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 32
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '+')
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if !is_valid_language(&config.ocr.default_language) {
        return Err(ConfigError::Validation {
            message: format!(
                "Invalid default OCR language: '{}'",
                config.ocr.default_language
            ),
        });
    }

    if !(50..=1200).contains(&config.ocr.dpi) {
        return Err(ConfigError::Validation {
            message: format!("OCR dpi must be between 50 and 1200, got {}", config.ocr.dpi),
        });
    }

    let preprocess = &config.preprocess;
    if preprocess.denoise_strength.is_nan() || preprocess.denoise_strength <= 0.0 {
        return Err(ConfigError::Validation {
            message: "denoise_strength must be positive".to_string(),
        });
    }
    if preprocess.patch_radius > 10 || preprocess.search_radius > 20 {
        return Err(ConfigError::Validation {
            message: format!(
                "Denoise window too large (patch_radius {}, search_radius {})",
                preprocess.patch_radius, preprocess.search_radius
            ),
        });
    }

    if config.limits.max_upload_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "max_upload_bytes must be greater than zero".to_string(),
        });
    }
    if config.limits.max_image_dimension == 0 {
        return Err(ConfigError::Validation {
            message: "max_image_dimension must be greater than zero".to_string(),
        });
    }

    Ok(())
}
