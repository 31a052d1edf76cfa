//! Index store: durable persistence and incremental maintenance of entries.
//!
//! The persisted artifact is a single JSON envelope carrying a format
//! version, the embedder signature, and a sha256 digest over the serialized
//! index body. Saves go through a temp file in the target directory and an
//! atomic rename, so a crash mid-write never leaves a partial index behind.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use librarian_core::KnowledgeSettings;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::chunker::chunk_text;
use crate::embedder::Embedder;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::loader;
use crate::models::{DocumentFormat, IndexEntry, RefreshSummary};

/// Bumped whenever the on-disk layout changes shape.
const FORMAT_VERSION: u32 = 1;

/// The complete in-memory index: every entry plus the version tag of the
/// embedding function that produced the vectors.
///
/// Invariant: each document owns exactly one contiguous run of entries, and
/// all embeddings share `dimension`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Index {
    /// Signature of the embedder that built the vectors.
    pub embedder: String,
    pub dimension: usize,
    /// Content checksum per indexed document, keyed by path.
    pub documents: BTreeMap<PathBuf, String>,
    /// Entries in insertion order (earlier-ingested documents first).
    pub entries: Vec<IndexEntry>,
}

impl Index {
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Document paths in entry insertion order, then zero-entry documents
    /// in path order.
    fn document_order(&self) -> Vec<PathBuf> {
        let mut order: Vec<PathBuf> = Vec::new();
        for entry in &self.entries {
            if order.last() != Some(&entry.path) && !order.contains(&entry.path) {
                order.push(entry.path.clone());
            }
        }
        for path in self.documents.keys() {
            if !order.contains(path) {
                order.push(path.clone());
            }
        }
        order
    }

    fn entries_for(&self, path: &Path) -> Vec<IndexEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.path == path)
            .cloned()
            .collect()
    }
}

/// On-disk envelope around [`Index`].
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    format_version: u32,
    /// Hex sha256 of the serialized index body.
    digest: String,
    index: Index,
}

/// Owns ingestion and persistence of [`Index`] values.
///
/// The store itself is stateless between calls; callers hold the index
/// snapshots it produces.
pub struct IndexStore {
    settings: KnowledgeSettings,
    embedder: Arc<dyn Embedder>,
}

impl IndexStore {
    pub fn new(settings: KnowledgeSettings, embedder: Arc<dyn Embedder>) -> Self {
        Self { settings, embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Full rebuild: ingest every supported file under `documents_dir`.
    ///
    /// Per-document read failures are skipped and reported; an embedding
    /// failure that survives its bounded retries aborts the whole build, so
    /// a persisted full rebuild never has silent gaps.
    pub async fn build(
        &self,
        documents_dir: &Path,
    ) -> KnowledgeResult<(Index, RefreshSummary)> {
        self.validate(documents_dir)?;

        let mut index = Index {
            embedder: self.embedder.signature().to_string(),
            dimension: self.settings.embedding_dim.unwrap_or(0),
            ..Default::default()
        };
        let mut summary = RefreshSummary::default();

        for path in scan_documents(documents_dir) {
            match self.ingest_document(&path, &mut index.dimension).await {
                Ok((checksum, entries)) => {
                    index.documents.insert(path.clone(), checksum);
                    index.entries.extend(entries);
                    summary.added.push(path);
                }
                Err(err) if err.is_per_document() => {
                    warn!(path = %path.display(), "skipping document: {err}");
                    summary.record_failure(&path, err.to_string());
                }
                // Embedding failures are fatal here: all-or-nothing rebuild.
                Err(err) => return Err(err),
            }
        }

        info!(
            documents = index.document_count(),
            entries = index.entry_count(),
            "index built"
        );
        Ok((index, summary))
    }

    /// Incremental update: diff the document set on disk against `existing`
    /// by path and content checksum.
    ///
    /// Unchanged documents are never re-embedded. Failures are local: a
    /// document that cannot be re-ingested keeps its previous entries and is
    /// reported in the summary.
    pub async fn update(
        &self,
        documents_dir: &Path,
        existing: &Index,
    ) -> KnowledgeResult<(Index, RefreshSummary)> {
        self.validate(documents_dir)?;

        let requested = self.embedder.signature();
        if existing.embedder != requested {
            return Err(KnowledgeError::IndexIncompatible {
                stored: existing.embedder.clone(),
                requested: requested.to_string(),
            });
        }

        let mut summary = RefreshSummary::default();
        let mut on_disk: BTreeMap<PathBuf, Option<String>> = BTreeMap::new();
        for path in scan_documents(documents_dir) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    on_disk.insert(path, Some(loader::compute_checksum(&bytes)));
                }
                Err(err) => {
                    warn!(path = %path.display(), "cannot checksum document: {err}");
                    summary.record_failure(&path, err.to_string());
                    on_disk.insert(path, None);
                }
            }
        }

        let mut next = Index {
            embedder: existing.embedder.clone(),
            dimension: existing.dimension,
            ..Default::default()
        };

        // Existing documents first, in their original insertion order.
        for path in existing.document_order() {
            let Some(old_checksum) = existing.documents.get(&path) else {
                continue;
            };
            match on_disk.get(&path) {
                None => {
                    summary.removed.push(path);
                }
                Some(None) => {
                    // Unreadable this round; failure already recorded. Keep
                    // the previous entries, the document still exists.
                    next.documents.insert(path.clone(), old_checksum.clone());
                    next.entries.extend(existing.entries_for(&path));
                }
                Some(Some(checksum)) if checksum == old_checksum => {
                    next.documents.insert(path.clone(), old_checksum.clone());
                    next.entries.extend(existing.entries_for(&path));
                    summary.unchanged += 1;
                }
                Some(Some(_)) => {
                    match self.ingest_document(&path, &mut next.dimension).await {
                        Ok((checksum, entries)) => {
                            next.documents.insert(path.clone(), checksum);
                            next.entries.extend(entries);
                            summary.changed.push(path);
                        }
                        Err(err) => {
                            warn!(path = %path.display(), "re-ingest failed, keeping stale entries: {err}");
                            summary.record_failure(&path, err.to_string());
                            next.documents.insert(path.clone(), old_checksum.clone());
                            next.entries.extend(existing.entries_for(&path));
                        }
                    }
                }
            }
        }

        // New documents append in path order.
        for (path, checksum) in &on_disk {
            if existing.documents.contains_key(path) || checksum.is_none() {
                continue;
            }
            match self.ingest_document(path, &mut next.dimension).await {
                Ok((checksum, entries)) => {
                    next.documents.insert(path.clone(), checksum);
                    next.entries.extend(entries);
                    summary.added.push(path.clone());
                }
                Err(err) => {
                    warn!(path = %path.display(), "skipping new document: {err}");
                    summary.record_failure(&path, err.to_string());
                }
            }
        }

        info!(
            added = summary.added.len(),
            changed = summary.changed.len(),
            removed = summary.removed.len(),
            unchanged = summary.unchanged,
            failed = summary.failures.len(),
            "index updated"
        );
        Ok((next, summary))
    }

    /// Load, chunk and embed one document.
    ///
    /// `dimension` is pinned on the first embedded batch and every later
    /// batch must match it.
    async fn ingest_document(
        &self,
        path: &Path,
        dimension: &mut usize,
    ) -> KnowledgeResult<(String, Vec<IndexEntry>)> {
        let document = loader::load(path, self.settings.max_document_bytes).await?;
        let spans = chunk_text(&document.text, &self.settings.chunk);

        let mut entries = Vec::with_capacity(spans.len());
        let batch_size = self.settings.embedding_batch.max(1);

        for batch in spans.chunks(batch_size) {
            let inputs: Vec<String> = batch.iter().map(|span| span.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&inputs).await?;

            for (span, embedding) in batch.iter().zip(vectors) {
                if *dimension == 0 {
                    *dimension = embedding.len();
                } else if embedding.len() != *dimension {
                    return Err(KnowledgeError::EmbeddingDimMismatch {
                        expected: *dimension,
                        actual: embedding.len(),
                    });
                }
                entries.push(IndexEntry {
                    path: document.path.clone(),
                    checksum: document.checksum.clone(),
                    chunk_index: span.index,
                    text: span.text.clone(),
                    start: span.start,
                    end: span.end,
                    embedding,
                });
            }
        }

        Ok((document.checksum, entries))
    }

    fn validate(&self, documents_dir: &Path) -> KnowledgeResult<()> {
        if documents_dir.as_os_str().is_empty() {
            return Err(KnowledgeError::InvalidArgument(
                "documents directory path is empty".to_string(),
            ));
        }
        if !documents_dir.is_dir() {
            return Err(KnowledgeError::InvalidArgument(format!(
                "not a directory: {}",
                documents_dir.display()
            )));
        }
        if !self.settings.chunk.is_valid() {
            return Err(KnowledgeError::InvalidArgument(format!(
                "chunk overlap {} must be smaller than window {}",
                self.settings.chunk.overlap, self.settings.chunk.max_chars
            )));
        }
        Ok(())
    }
}

/// Deserialize a previously persisted index, verifying format version and
/// payload digest. Any mismatch or parse failure is `IndexCorrupt`; the
/// caller is expected to fall back to a full build.
pub fn load(index_path: &Path) -> KnowledgeResult<Index> {
    let bytes = std::fs::read(index_path)?;

    let file: IndexFile = serde_json::from_slice(&bytes)
        .map_err(|e| KnowledgeError::IndexCorrupt(format!("unparseable index file: {e}")))?;

    if file.format_version != FORMAT_VERSION {
        return Err(KnowledgeError::IndexCorrupt(format!(
            "unknown format version {}",
            file.format_version
        )));
    }

    let digest = body_digest(&file.index)?;
    if digest != file.digest {
        return Err(KnowledgeError::IndexCorrupt(
            "payload digest mismatch".to_string(),
        ));
    }

    Ok(file.index)
}

/// Persist the index atomically: serialize to a temp file in the target's
/// directory, then rename over the target. The serialization is fully
/// deterministic, so saving an unchanged index is byte-identical.
pub fn save(index: &Index, index_path: &Path) -> KnowledgeResult<()> {
    let parent = index_path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(KnowledgeError::IndexIo)?;

    let file = IndexFile {
        format_version: FORMAT_VERSION,
        digest: body_digest(index)?,
        index: index.clone(),
    };
    let bytes = serde_json::to_vec(&file)
        .map_err(|e| KnowledgeError::IndexCorrupt(format!("serialize failed: {e}")))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(KnowledgeError::IndexIo)?;
    temp.write_all(&bytes).map_err(KnowledgeError::IndexIo)?;
    temp.flush().map_err(KnowledgeError::IndexIo)?;
    temp.persist(index_path)
        .map_err(|e| KnowledgeError::IndexIo(e.error))?;

    Ok(())
}

fn body_digest(index: &Index) -> KnowledgeResult<String> {
    let body = serde_json::to_vec(index)
        .map_err(|e| KnowledgeError::IndexCorrupt(format!("serialize failed: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(&body);
    Ok(hex::encode(hasher.finalize()))
}

/// Supported files under `documents_dir`, sorted for deterministic order.
fn scan_documents(documents_dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(documents_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| DocumentFormat::from_path(path).is_some())
        .collect()
}
