use super::models::Config;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "GENOFLOW_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/genoflow.toml";
const ENV_PREFIX: &str = "GENOFLOW";
const ENV_SEPARATOR: &str = "__";

/// The config file path in effect: `GENOFLOW_CONFIG` or the default.
pub fn config_path() -> PathBuf {
    env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if it exists)
/// 3. Environment variables from .env file (via dotenvy)
/// 4. System environment variables (highest priority)
pub fn load() -> Result<Config, ConfigError> {
    // Load .env if present; ignore a missing file.
    let _ = dotenvy::dotenv();

    let mut config = load_from_sources(config_path())?;
    load_secrets(&mut config);
    Ok(config)
}

/// Secrets come from the environment only, never from the TOML file.
fn load_secrets(config: &mut Config) {
    if let Ok(password) = env::var("GENOFLOW_SFTP_PASSWORD") {
        config.sftp.password = Some(password);
    }
}

/// Load configuration from a specific path plus environment overrides.
pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("loading configuration from {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "no configuration file at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // GENOFLOW__SFTP__HOST -> sftp.host
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
