//! Settings, resolved as defaults → config file → CLI flags.
//!
//! The file lives at `<config_dir>/laneboard/config.toml`. Every field is
//! optional; a missing file is the same as an empty one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;

use crate::board::storage::default_store_path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unknown log level {0:?}: use off, error, warn, info, debug, trace")]
    LogLevel(String),
}

impl ConfigError {
    /// Config file the error came from, if it names one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigError::Io { path, .. } | ConfigError::Toml { path, .. } => Some(path),
            ConfigError::LogLevel(_) => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub store_path: Option<PathBuf>,
    pub mouse: Option<bool>,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogSection {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub store_path: PathBuf,
    pub mouse: bool,
    pub log_level: LevelFilter,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            mouse: true,
            log_level: LevelFilter::Info,
            log_file: default_log_path(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("laneboard")
        .join("config.toml")
}

fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("laneboard")
        .join("laneboard.log")
}

/// Read the config file at `path`. Absent file → empty config.
pub fn read_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    match fs::read_to_string(path) {
        Ok(s) => toml::from_str(&s).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl Config {
    /// Layer a parsed config file over the defaults.
    pub fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = file.store_path {
            config.store_path = path;
        }
        if let Some(mouse) = file.mouse {
            config.mouse = mouse;
        }
        if let Some(level) = file.log.level {
            config.log_level = level
                .parse::<LevelFilter>()
                .map_err(|_| ConfigError::LogLevel(level))?;
        }
        if let Some(path) = file.log.file {
            config.log_file = path;
        }
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
        Self::from_file(read_config_file(&path)?)
    }
}
