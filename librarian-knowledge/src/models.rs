use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Supported document formats, keyed by file extension.
///
/// The set is closed on purpose: anything else is an `UnsupportedFormat`
/// error at load time and is skipped by directory scans.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from a path's extension, if supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(Self::PlainText),
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::PlainText),
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded document: one normalized text stream plus metadata.
///
/// Immutable once loaded; re-ingestion replaces it wholesale.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub format: DocumentFormat,
    pub text: String,
    /// Hex sha256 of the raw file bytes, used for change detection.
    pub checksum: String,
    pub loaded_at: DateTime<Utc>,
}

/// A bounded passage cut from one document, the unit of embedding and
/// retrieval. Offsets are char offsets into the normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// The durable unit persisted in the index: chunk, vector, document metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub path: PathBuf,
    /// Checksum of the owning document at ingestion time.
    pub checksum: String,
    pub chunk_index: usize,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub embedding: Vec<f32>,
}

/// One ranked search result surfaced to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    pub source: PathBuf,
    pub score: f32,
}

/// A per-document failure recovered during batch ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome summary of a `build`/`refresh` operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshSummary {
    pub added: Vec<PathBuf>,
    pub changed: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub unchanged: usize,
    pub failures: Vec<DocumentFailure>,
}

impl RefreshSummary {
    pub fn record_failure(&mut self, path: &Path, reason: impl Into<String>) {
        self.failures.push(DocumentFailure {
            path: path.to_path_buf(),
            reason: reason.into(),
        });
    }
}

/// Point-in-time description of the engine's loaded index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    pub documents: usize,
    pub entries: usize,
    pub embedder: String,
    pub dimension: usize,
}
