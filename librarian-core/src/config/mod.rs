//! Configuration management for librarian.
//!
//! Settings live in a TOML file at `~/.config/librarian/config.toml`
//! (`LIBRARIAN_CONFIG_DIR` overrides the directory). The user-facing
//! [`Settings`] struct is sparse (every field optional) and resolves into a
//! dense [`KnowledgeSettings`] with defaults filled in, which is what the
//! knowledge engine consumes.
//!
//! ```toml
//! [knowledge]
//! embedding_url = "http://127.0.0.1:11434"
//! embedding_model = "nomic-embed-text"
//! chunk_max_chars = 512
//! chunk_overlap = 50
//! ```

pub mod knowledge;
mod settings;

pub use knowledge::{ChunkPolicy, KnowledgeSettings, SearchDefaults};
pub use settings::{KnowledgeUserSettings, Settings, SettingsError};
