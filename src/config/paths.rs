use crate::config::ConfigError;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_STATE_DIR: &str = ".duet";
pub const SETTINGS_FILE_NAME: &str = "config.yaml";
pub const DATABASE_FILE_NAME: &str = "duet.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    pub root: PathBuf,
}

impl StatePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    pub fn default_database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE_NAME)
    }
}

pub fn default_state_root_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(DEFAULT_STATE_DIR))
}

pub fn bootstrap_state_root(paths: &StatePaths) -> Result<(), ConfigError> {
    fs::create_dir_all(&paths.root).map_err(|source| ConfigError::CreateDir {
        path: paths.root.display().to_string(),
        source,
    })
}
