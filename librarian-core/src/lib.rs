pub mod config;

pub use config::{
    ChunkPolicy, KnowledgeSettings, KnowledgeUserSettings, SearchDefaults, Settings, SettingsError,
};
