//! Settings loaded from the TOML configuration file.
//!
//! Non-sensitive configuration stored in TOML format in the XDG config
//! directory (`~/.config/librarian/config.toml`). Every field is optional;
//! resolution into dense defaults happens in [`super::knowledge`].

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::knowledge::KnowledgeSettings;

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# librarian configuration file
# Located at: ~/.config/librarian/config.toml

[knowledge]
# embedding_url = "http://127.0.0.1:11434"
# embedding_model = "nomic-embed-text"
# chunk_max_chars = 512
# chunk_overlap = 50
# documents_root = "/path/to/documents"
"#;

/// Top-level user-facing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub knowledge: KnowledgeUserSettings,
}

/// User-facing knowledge settings, all optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeUserSettings {
    pub embedding_url: Option<String>,
    pub embedding_model: Option<String>,
    pub embedding_dim: Option<usize>,
    pub embedding_batch: Option<usize>,
    pub embedding_timeout_secs: Option<u64>,
    pub embedding_retries: Option<usize>,
    pub chunk_max_chars: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub chunk_min_chars: Option<usize>,
    pub max_document_bytes: Option<u64>,
    pub documents_root: Option<String>,
    pub index_path: Option<String>,
    pub max_results: Option<usize>,
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Resolve the dense knowledge settings from this file.
    pub fn knowledge_settings(&self) -> KnowledgeSettings {
        KnowledgeSettings::from(&self.knowledge)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/librarian/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("LIBRARIAN_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("librarian");

        Ok(config_dir.join("config.toml"))
    }

    /// Create the default configuration file.
    fn create_default_config(path: &PathBuf) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }
}
