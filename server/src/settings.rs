//! Server settings: the library `Config` plus environment overrides.

use std::path::PathBuf;

use ocrbatch::{load_config, Config, ConfigError};

/// Path of the JSON config file.
pub const CONFIG_ENV: &str = "OCRBATCH_CONFIG";
pub const HOST_ENV: &str = "OCRBATCH_HOST";
pub const PORT_ENV: &str = "OCRBATCH_PORT";

/// Loads the config named by `OCRBATCH_CONFIG` (defaults when unset) and
/// applies the host/port overrides from the environment.
pub fn load_from_env() -> Result<Config, ConfigError> {
    let config = match std::env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            tracing::info!(path = %path.display(), "Loading configuration");
            load_config(&path)?
        }
        None => Config::default(),
    };

    apply_overrides(
        config,
        std::env::var(HOST_ENV).ok(),
        std::env::var(PORT_ENV).ok(),
    )
}

pub fn apply_overrides(
    mut config: Config,
    host: Option<String>,
    port: Option<String>,
) -> Result<Config, ConfigError> {
    if let Some(host) = host.filter(|h| !h.trim().is_empty()) {
        config.server.host = host.trim().to_string();
    }

    if let Some(port) = port {
        config.server.port = port.trim().parse().map_err(|_| ConfigError::Validation {
            message: format!("{} must be a port number, got '{}'", PORT_ENV, port),
        })?;
    }

    Ok(config)
}
