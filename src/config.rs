//! TOML configuration loading

use std::fs;
use std::path::Path;

use floodroute_core::loading::EngineConfig;
use log::info;

use crate::Error;

/// Parses and validates a TOML document. Missing sections take their
/// defaults.
///
/// # Errors
///
/// Returns an error for malformed TOML or values that fail validation
pub fn parse_config(text: &str) -> Result<EngineConfig, Error> {
    let config: EngineConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Reads a configuration file. A relative `network.path` is resolved
/// against the directory holding the file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_config(path: &Path) -> Result<EngineConfig, Error> {
    let text = fs::read_to_string(path)?;
    let mut config = parse_config(&text)?;
    if let (Some(dataset), Some(base)) = (config.network.path.as_ref(), path.parent())
        && dataset.is_relative()
    {
        config.network.path = Some(base.join(dataset));
    }
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}
