use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("missing data directory")]
    MissingDataDir,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("failed to read document {path}: {reason}")]
    DocumentRead { path: PathBuf, reason: String },
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    EmbeddingDimMismatch { expected: usize, actual: usize },
    #[error("index corrupt: {0}")]
    IndexCorrupt(String),
    #[error("index incompatible: built with '{stored}', requested '{requested}'")]
    IndexIncompatible { stored: String, requested: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("index write failed: {0}")]
    IndexIo(std::io::Error),
}

impl KnowledgeError {
    /// Whether this failure is local to one document and should not abort a
    /// batch ingestion.
    pub fn is_per_document(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedFormat(_) | Self::DocumentRead { .. }
        )
    }
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
