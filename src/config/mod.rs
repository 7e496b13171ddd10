pub mod error;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use paths::{
    bootstrap_state_root, default_state_root_path, StatePaths, DATABASE_FILE_NAME,
    DEFAULT_STATE_DIR, SETTINGS_FILE_NAME,
};
pub use settings::{
    load_settings_from, Settings, DATABASE_PATH_ENV_VAR, DEFAULT_OLLAMA_HOST,
    OLLAMA_HOST_ENV_VAR,
};
