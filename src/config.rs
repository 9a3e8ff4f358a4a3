//! User configuration: `config.toml` in the per-user config directory.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tally_core::ACCEPT_ALL;

const MAX_CONFIG_FILE_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pattern every cell name must match, after upper-casing
    pub is_valid: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            is_valid: ACCEPT_ALL.to_string(),
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tally")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

/// Load the config from `config_file`, or from the user config directory.
///
/// Never fails: problems are returned as warnings and the defaults are used.
/// A missing file in the user config directory is not a problem.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let path = match config_file {
        Some(path) => path.to_path_buf(),
        None => match user_config_path() {
            Some(path) => path,
            None => return (Config::default(), warnings),
        },
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let content = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Ignoring {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            return (Config::default(), warnings);
        }
        Ok(_) => std::fs::read_to_string(&path),
        Err(err) => Err(err),
    };

    match content {
        Ok(content) => match parse_config(&content) {
            Ok(config) => {
                log::debug!("loaded config from {}", path.display());
                (config, warnings)
            }
            Err(err) => {
                warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                (Config::default(), warnings)
            }
        },
        Err(err) => {
            warnings.push(format!("Failed to read {}: {}", path.display(), err));
            (Config::default(), warnings)
        }
    }
}
