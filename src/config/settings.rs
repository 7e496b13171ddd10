use super::{ConfigError, StatePaths};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const OLLAMA_HOST_ENV_VAR: &str = "DUET_OLLAMA_HOST";
pub const DATABASE_PATH_ENV_VAR: &str = "DUET_DATABASE_PATH";

const MIN_REFRESH_RATE_HZ: u32 = 1;
const MAX_REFRESH_RATE_HZ: u32 = 120;
const MIN_BUBBLE_WIDTH_PERCENT: u16 = 20;
const MAX_BUBBLE_WIDTH_PERCENT: u16 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
    #[serde(default = "default_refresh_rate_hz")]
    pub refresh_rate_hz: u32,
    #[serde(default = "default_bubble_width_percent")]
    pub bubble_width_percent: u16,
}

fn default_ollama_host() -> String {
    DEFAULT_OLLAMA_HOST.to_string()
}

fn default_refresh_rate_hz() -> u32 {
    10
}

fn default_bubble_width_percent() -> u16 {
    70
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: None,
            ollama_host: default_ollama_host(),
            refresh_rate_hz: default_refresh_rate_hz(),
            bubble_width_percent: default_bubble_width_percent(),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Environment variables take precedence over the settings file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(OLLAMA_HOST_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.ollama_host = host.trim().to_string();
        }
        if let Some(path) = lookup(DATABASE_PATH_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path.trim()));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.ollama_host.trim();
        if !(host.starts_with("http://") || host.starts_with("https://")) {
            return Err(ConfigError::Settings(format!(
                "ollama_host `{host}` must start with http:// or https://"
            )));
        }
        if !(MIN_REFRESH_RATE_HZ..=MAX_REFRESH_RATE_HZ).contains(&self.refresh_rate_hz) {
            return Err(ConfigError::Settings(format!(
                "refresh_rate_hz must be between {MIN_REFRESH_RATE_HZ} and {MAX_REFRESH_RATE_HZ}"
            )));
        }
        if !(MIN_BUBBLE_WIDTH_PERCENT..=MAX_BUBBLE_WIDTH_PERCENT)
            .contains(&self.bubble_width_percent)
        {
            return Err(ConfigError::Settings(format!(
                "bubble_width_percent must be between {MIN_BUBBLE_WIDTH_PERCENT} and {MAX_BUBBLE_WIDTH_PERCENT}"
            )));
        }
        if self
            .database_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err(ConfigError::Settings(
                "database_path must be non-empty when set".to_string(),
            ));
        }
        Ok(())
    }

    pub fn resolve_database_path(&self, paths: &StatePaths) -> PathBuf {
        match &self.database_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => paths.root.join(path),
            None => paths.default_database_path(),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(1000 / u64::from(self.refresh_rate_hz.max(1)))
    }
}

/// Reads `config.yaml` from the state root, falling back to defaults when the
/// file does not exist yet.
pub fn load_settings_from(paths: &StatePaths) -> Result<Settings, ConfigError> {
    let path = paths.settings_file();
    let mut settings = if path.exists() {
        Settings::from_path(&path)?
    } else {
        Settings::default()
    };
    settings.apply_env_overrides(|key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_yaml::from_str("refresh_rate_hz: 30\n").expect("parse");
        assert_eq!(settings.refresh_rate_hz, 30);
        assert_eq!(settings.ollama_host, DEFAULT_OLLAMA_HOST);
        assert_eq!(settings.bubble_width_percent, 70);
        assert_eq!(settings.database_path, None);
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(|key| match key {
            OLLAMA_HOST_ENV_VAR => Some("http://10.0.0.2:11434".to_string()),
            DATABASE_PATH_ENV_VAR => Some("/var/lib/duet.db".to_string()),
            _ => None,
        });
        assert_eq!(settings.ollama_host, "http://10.0.0.2:11434");
        assert_eq!(
            settings.database_path,
            Some(PathBuf::from("/var/lib/duet.db"))
        );
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut settings = Settings::default();
        settings.apply_env_overrides(|_| Some("   ".to_string()));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut settings = Settings {
            refresh_rate_hz: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        settings.refresh_rate_hz = 10;
        settings.ollama_host = "localhost:11434".to_string();
        let err = settings.validate().expect_err("scheme required");
        assert!(err.to_string().contains("must start with http://"));

        settings.ollama_host = DEFAULT_OLLAMA_HOST.to_string();
        settings.bubble_width_percent = 5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn relative_database_path_resolves_under_state_root() {
        let paths = StatePaths::new("/home/user/.duet");
        let settings = Settings {
            database_path: Some(PathBuf::from("data/chats.db")),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_database_path(&paths),
            PathBuf::from("/home/user/.duet/data/chats.db")
        );
        assert_eq!(
            Settings::default().resolve_database_path(&paths),
            PathBuf::from("/home/user/.duet/duet.db")
        );
    }

    #[test]
    fn refresh_interval_follows_rate() {
        let settings = Settings {
            refresh_rate_hz: 4,
            ..Settings::default()
        };
        assert_eq!(settings.refresh_interval(), Duration::from_millis(250));
    }

    #[test]
    fn from_path_reports_parse_errors_with_path() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.yaml");
        fs::write(&path, "refresh_rate_hz: [oops").expect("write");
        let err = Settings::from_path(&path).expect_err("invalid yaml");
        match err {
            ConfigError::Parse { path: reported, .. } => {
                assert!(reported.ends_with("config.yaml"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
