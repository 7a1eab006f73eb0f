use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{RelflowError, Result};

/// Configuration for relflow.
///
/// Everything has a sensible default; a config file is only needed to
/// override the remote name or the version record file name.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Remote that branches and tags are pushed to
    #[serde(default = "default_remote")]
    pub remote: String,

    /// File name of the version record, relative to the working-tree root.
    /// Other tooling may read this file; changing the name is a
    /// compatibility decision.
    #[serde(default = "default_version_file")]
    pub version_file: String,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_version_file() -> String {
    "version.info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            remote: default_remote(),
            version_file: default_version_file(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `relflow.toml` in current directory
/// 3. `.relflow.toml` in the user config directory
/// 4. Default configuration if no file found
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)
            .map_err(|e| RelflowError::config(format!("cannot read '{}': {}", path, e)))?
    } else if Path::new("./relflow.toml").exists() {
        fs::read_to_string("./relflow.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".relflow.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config =
        toml::from_str(&config_str).map_err(|e| RelflowError::config(e.to_string()))?;
    Ok(config)
}
