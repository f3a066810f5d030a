//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::BakeConfig;
use bake_source::SourceType;
use std::path::Path;

/// The configuration file name looked up in the project directory.
pub const CONFIG_FILE_NAME: &str = "bake.toml";

/// Loads and validates a `bake.toml` configuration from a project directory.
///
/// A missing file is not an error: the defaults are returned instead.
pub fn load_config(project_dir: &Path) -> Result<BakeConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BakeConfig::default()),
        Err(e) => return Err(e.into()),
    };
    load_config_from_str(&content)
}

/// Parses and validates a `bake.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<BakeConfig, ConfigError> {
    let config: BakeConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &BakeConfig) -> Result<(), ConfigError> {
    if config.include.extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "include.extensions must name at least one extension".to_string(),
        ));
    }
    if let Some(ext) = config
        .include
        .extensions
        .iter()
        .find(|e| SourceType::from_extension(e).is_none())
    {
        return Err(ConfigError::ValidationError(format!(
            "include.extensions entry '{ext}' is not a script extension; \
             expected one of js, mjs, cjs, jsx, ts, mts, cts, tsx"
        )));
    }
    if config.errors.trim_stacks && config.errors.stack_marker.is_empty() {
        return Err(ConfigError::ValidationError(
            "errors.stack_marker must not be empty while errors.trim_stacks is enabled"
                .to_string(),
        ));
    }
    Ok(())
}
