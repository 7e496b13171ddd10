use crate::config::{
    bootstrap_state_root, default_state_root_path, load_settings_from, Settings, StatePaths,
};
use crate::ollama::OllamaClient;
use crate::persistence::Database;
use crate::render::ChatView;

pub const SUCCESS_MARK: &str = "✅";
pub const FAILURE_MARK: &str = "❌";

pub fn success(message: impl std::fmt::Display) -> String {
    format!("{SUCCESS_MARK} {message}")
}

/// Resolved state for one command invocation.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub paths: StatePaths,
    pub settings: Settings,
}

impl CommandContext {
    pub fn load() -> Result<Self, String> {
        let root = default_state_root_path().map_err(|e| e.to_string())?;
        let paths = StatePaths::new(root);
        bootstrap_state_root(&paths).map_err(|e| e.to_string())?;
        let settings = load_settings_from(&paths).map_err(|e| e.to_string())?;
        Ok(Self { paths, settings })
    }

    pub fn open_database(&self) -> Result<Database, String> {
        let path = self.settings.resolve_database_path(&self.paths);
        Database::open(&path).map_err(|e| e.to_string())
    }

    pub fn model_client(&self) -> OllamaClient {
        OllamaClient::new(self.settings.ollama_host.clone())
    }

    pub fn view(&self) -> Result<ChatView, String> {
        ChatView::detect(&self.settings).map_err(|e| e.to_string())
    }
}
