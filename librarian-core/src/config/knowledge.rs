//! Knowledge engine configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `librarian-knowledge`. They are created from the user-facing
//! [`KnowledgeUserSettings`](super::KnowledgeUserSettings) TOML struct via
//! `From`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::KnowledgeUserSettings;

/// Resolved knowledge engine settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Expected vector dimension. When unset it is learned from the first
    /// embedding batch and pinned into the index.
    #[serde(default)]
    pub embedding_dim: Option<usize>,
    #[serde(default = "default_embedding_batch")]
    pub embedding_batch: usize,
    #[serde(default = "default_embedding_timeout_secs")]
    pub embedding_timeout_secs: u64,
    /// Bounded retry count for a failing embedding batch.
    #[serde(default = "default_embedding_retries")]
    pub embedding_retries: usize,
    #[serde(default)]
    pub chunk: ChunkPolicy,
    /// Files larger than this are skipped at load time.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
    /// Override the directory scanned for documents.
    #[serde(default)]
    pub documents_root_override: Option<PathBuf>,
    /// Override the persisted index file path.
    #[serde(default)]
    pub index_path_override: Option<PathBuf>,
    /// Override the root data directory for all knowledge paths.
    /// Primarily for testing.
    #[serde(default)]
    pub data_root_override: Option<PathBuf>,
    #[serde(default)]
    pub search: SearchDefaults,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: None,
            embedding_batch: default_embedding_batch(),
            embedding_timeout_secs: default_embedding_timeout_secs(),
            embedding_retries: default_embedding_retries(),
            chunk: ChunkPolicy::default(),
            max_document_bytes: default_max_document_bytes(),
            documents_root_override: None,
            index_path_override: None,
            data_root_override: None,
            search: SearchDefaults::default(),
        }
    }
}

/// Chunking policy: window length, overlap and the minimum size a chunk must
/// reach to be kept at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkPolicy {
    #[serde(default = "default_chunk_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,
    #[serde(default = "default_chunk_min_chars")]
    pub min_chars: usize,
}

impl ChunkPolicy {
    /// Check the `0 <= overlap < max_chars` constraint.
    pub fn is_valid(&self) -> bool {
        self.max_chars > 0 && self.overlap < self.max_chars
    }
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            max_chars: default_chunk_max_chars(),
            overlap: default_chunk_overlap(),
            min_chars: default_chunk_min_chars(),
        }
    }
}

/// Resolved search tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_batch() -> usize {
    32
}

fn default_embedding_timeout_secs() -> u64 {
    30
}

fn default_embedding_retries() -> usize {
    3
}

fn default_chunk_max_chars() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    50
}

fn default_chunk_min_chars() -> usize {
    20
}

fn default_max_document_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_max_results() -> usize {
    3
}

impl From<&KnowledgeUserSettings> for KnowledgeSettings {
    fn from(value: &KnowledgeUserSettings) -> Self {
        let mut settings = KnowledgeSettings::default();
        if let Some(url) = &value.embedding_url {
            settings.embedding_url = url.clone();
        }
        if let Some(model) = &value.embedding_model {
            settings.embedding_model = model.clone();
        }
        if let Some(dim) = value.embedding_dim {
            settings.embedding_dim = Some(dim);
        }
        if let Some(batch) = value.embedding_batch {
            settings.embedding_batch = batch;
        }
        if let Some(secs) = value.embedding_timeout_secs {
            settings.embedding_timeout_secs = secs;
        }
        if let Some(retries) = value.embedding_retries {
            settings.embedding_retries = retries;
        }
        if let Some(max_chars) = value.chunk_max_chars {
            settings.chunk.max_chars = max_chars;
        }
        if let Some(overlap) = value.chunk_overlap {
            settings.chunk.overlap = overlap;
        }
        if let Some(min_chars) = value.chunk_min_chars {
            settings.chunk.min_chars = min_chars;
        }
        if let Some(bytes) = value.max_document_bytes {
            settings.max_document_bytes = bytes;
        }
        if let Some(path) = &value.documents_root {
            settings.documents_root_override = Some(PathBuf::from(path));
        }
        if let Some(path) = &value.index_path {
            settings.index_path_override = Some(PathBuf::from(path));
        }
        if let Some(max_results) = value.max_results {
            settings.search.max_results = max_results;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert!(ChunkPolicy::default().is_valid());
    }

    #[test]
    fn overlap_must_stay_below_window() {
        let policy = ChunkPolicy {
            max_chars: 100,
            overlap: 100,
            min_chars: 0,
        };
        assert!(!policy.is_valid());
    }

    #[test]
    fn user_settings_override_defaults() {
        let user = KnowledgeUserSettings {
            embedding_model: Some("all-minilm".to_string()),
            chunk_max_chars: Some(256),
            ..Default::default()
        };
        let resolved = KnowledgeSettings::from(&user);
        assert_eq!(resolved.embedding_model, "all-minilm");
        assert_eq!(resolved.chunk.max_chars, 256);
        assert_eq!(resolved.chunk.overlap, 50);
    }
}
