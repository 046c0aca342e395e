//! # Configuration
//!
//! Loads the typed application settings.
//!
//! Sources, from lowest to highest precedence:
//!
//! 1. Built-in defaults.
//! 2. An optional `config.toml` (or the file given to `load_config_from`).
//! 3. `KPI__SECTION__KEY` environment variables, e.g. `KPI__DATABASE__MAX_CONNECTIONS=20`.

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{Config, DatabaseSettings, LoggingSettings};

const DEFAULT_FILE: &str = "config";
const ENV_PREFIX: &str = "KPI";

/// Loads the application configuration from `config.toml` and the environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(DEFAULT_FILE)
}

/// Loads the configuration from a specific file (extension optional) and the environment.
///
/// A missing file is not an error; every setting has a default.
pub fn load_config_from(path: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    tracing::debug!(source = path, "Configuration loaded.");
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }
    if config.logging.file_prefix.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "logging.file_prefix must not be empty".to_string(),
        ));
    }
    Ok(())
}
