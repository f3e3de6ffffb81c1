//! Configuration Loader
//!
//! Merges the configuration file, prefixed environment variables and the
//! original tool's plain variables into a validated `MigratorConfig`.

use super::error::{ConfigResult, ConfigurationError};
use super::MigratorConfig;
use crate::constants::env;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Plain variables of the original tool and the keys they override
const LEGACY_OVERRIDES: [(&str, &str); 5] = [
    (env::SPACE, "space"),
    (env::FROM_ENV, "source_environment"),
    (env::TO_ENV, "target_environment"),
    (env::READ_ACCESS_TOKEN, "read_access_token"),
    (env::MANAGE_ACCESS_TOKEN, "manage_access_token"),
];

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from an optional file and the process environment
    pub fn load(file: Option<&Path>) -> ConfigResult<MigratorConfig> {
        Self::load_from(file, std::env::vars().collect())
    }

    /// Load and validate configuration against an explicit variable set
    ///
    /// Useful for testing without modifying global environment variables.
    pub fn load_from(
        file: Option<&Path>,
        vars: HashMap<String, String>,
    ) -> ConfigResult<MigratorConfig> {
        let config = Self::merge(file, vars)?;
        config.validate()?;

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&config.sanitized())
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        Ok(config)
    }

    /// Merge every source without validating the result
    pub fn merge(
        file: Option<&Path>,
        vars: HashMap<String, String>,
    ) -> ConfigResult<MigratorConfig> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            debug!(file = %path.display(), "Loading configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let prefixed: config::Map<String, String> = vars
            .iter()
            .filter(|(key, _)| key.starts_with(env::CONFIG_PREFIX))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        builder = builder.add_source(
            config::Environment::with_prefix(env::CONFIG_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(Some(prefixed)),
        );

        for (variable, key) in LEGACY_OVERRIDES {
            let value = vars
                .get(variable)
                .filter(|value| !value.trim().is_empty())
                .cloned();
            builder = builder
                .set_override_option(key, value)
                .map_err(|e| ConfigurationError::environment_override_error(variable, e))?;
        }

        let merged = builder.build().map_err(|e| {
            let source = file
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "environment".to_string());
            ConfigurationError::file_load_error(source, e)
        })?;

        merged
            .try_deserialize::<MigratorConfig>()
            .map_err(ConfigurationError::deserialization_error)
    }
}
