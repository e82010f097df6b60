//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{ConfigPatch, Configuration};
use crate::config::validation::{validate_config, ValidationError};
use crate::error::IconError;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Invalid(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<IconError> for ConfigError {
    fn from(e: IconError) -> Self {
        ConfigError::Invalid(vec![ValidationError {
            field: "patch",
            message: e.to_string(),
        }])
    }
}

/// Read a TOML file holding a partial configuration.
pub fn load_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let patch: ConfigPatch = toml::from_str(&content).map_err(ConfigError::Parse)?;
    tracing::debug!(path = %path.display(), "Configuration file parsed");
    Ok(patch)
}

/// Load a TOML file as a patch over the defaults and validate the result.
pub fn load_config(path: &Path) -> Result<Configuration, ConfigError> {
    let patch = load_patch(path)?;
    let config = patch.apply(&Configuration::default())?;

    validate_config(&config).map_err(ConfigError::Invalid)?;

    Ok(config)
}
