use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::BoardConfig;

/// Config file looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "board.toml";

/// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Parse a config file.
pub fn read_config(path: &Path) -> Result<BoardConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the explicit config file (must exist), or `board.toml` in `cwd`
/// if present, or defaults.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<BoardConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let default_path = cwd.join(CONFIG_FILE);
    if default_path.exists() {
        read_config(&default_path)
    } else {
        Ok(BoardConfig::default())
    }
}

/// Session cache directory: configured, else $XDG_CACHE_HOME/taskboard,
/// else ~/.cache/taskboard.
pub fn cache_dir(config: &BoardConfig) -> PathBuf {
    if let Some(dir) = &config.cache.dir {
        return PathBuf::from(dir);
    }
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".cache"));
    base.join("taskboard")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}
