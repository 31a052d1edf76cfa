use std::path::PathBuf;
use std::sync::Arc;

use librarian_core::KnowledgeSettings;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::embedder::{Embedder, HttpEmbedder};
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{EngineStatus, RefreshSummary, SearchHit};
use crate::paths::{documents_root, index_path};
use crate::store::{self, Index, IndexStore};

pub(crate) mod query;
pub(crate) mod refresh;

/// The knowledge base facade: the only surface external callers interact
/// with.
///
/// Lifecycle is load-or-build at `open`, then Ready; `refresh` is
/// transactional and a failed refresh leaves the prior index intact.
/// Queries read an `Arc` snapshot, so they proceed in parallel and are
/// never blocked by a refresh in flight; the swap to the new snapshot is
/// atomic.
pub struct KnowledgeEngine {
    settings: KnowledgeSettings,
    store: IndexStore,
    documents_root: PathBuf,
    index_path: PathBuf,
    current: RwLock<Arc<Index>>,
    /// Serializes build/update/rebuild; queries never take it.
    writer: Mutex<()>,
}

impl KnowledgeEngine {
    /// Open an engine backed by the configured HTTP embedding backend.
    pub async fn open(settings: KnowledgeSettings) -> KnowledgeResult<Self> {
        let embedder = Arc::new(HttpEmbedder::new(&settings)?);
        Self::open_with_embedder(settings, embedder).await
    }

    /// Open an engine with an explicit embedding backend.
    ///
    /// Loads the persisted index when it exists and matches the embedder
    /// signature; otherwise falls back to a full build.
    pub async fn open_with_embedder(
        settings: KnowledgeSettings,
        embedder: Arc<dyn Embedder>,
    ) -> KnowledgeResult<Self> {
        if !settings.chunk.is_valid() {
            return Err(KnowledgeError::InvalidArgument(format!(
                "chunk overlap {} must be smaller than window {}",
                settings.chunk.overlap, settings.chunk.max_chars
            )));
        }

        let documents_root = documents_root(&settings)?;
        let index_path = index_path(&settings)?;
        tokio::fs::create_dir_all(&documents_root).await?;

        let store = IndexStore::new(settings.clone(), embedder.clone());
        let index = Self::load_or_build(&store, &documents_root, &index_path, &embedder).await?;

        Ok(Self {
            settings,
            store,
            documents_root,
            index_path,
            current: RwLock::new(Arc::new(index)),
            writer: Mutex::new(()),
        })
    }

    async fn load_or_build(
        store: &IndexStore,
        documents_root: &PathBuf,
        index_path: &PathBuf,
        embedder: &Arc<dyn Embedder>,
    ) -> KnowledgeResult<Index> {
        if index_path.exists() {
            match store::load(index_path) {
                Ok(index) if index.embedder == embedder.signature() => {
                    info!(
                        documents = index.document_count(),
                        entries = index.entry_count(),
                        "loaded persisted index"
                    );
                    return Ok(index);
                }
                Ok(index) => {
                    warn!(
                        stored = %index.embedder,
                        requested = %embedder.signature(),
                        "index built with a different embedder, rebuilding"
                    );
                }
                Err(KnowledgeError::IndexCorrupt(reason)) => {
                    warn!("persisted index corrupt ({reason}), rebuilding");
                }
                Err(err) => return Err(err),
            }
        }

        let (index, summary) = store.build(documents_root).await?;
        store::save(&index, index_path)?;
        if !summary.failures.is_empty() {
            warn!(failed = summary.failures.len(), "some documents were skipped during build");
        }
        Ok(index)
    }

    /// Access the knowledge settings.
    pub fn settings(&self) -> &KnowledgeSettings {
        &self.settings
    }

    /// Signature of the embedding backend pinned to this engine.
    pub fn embedder_signature(&self) -> &str {
        self.store.embedder().signature()
    }

    /// Answer a free-text query with the top `k` ranked passages.
    ///
    /// Never errors on an empty or unpopulated index; returns an empty list.
    pub async fn query(&self, text: &str, k: usize) -> KnowledgeResult<Vec<SearchHit>> {
        query::query(self, text, k).await
    }

    /// Incrementally reconcile the index with the documents directory.
    pub async fn refresh(&self) -> KnowledgeResult<RefreshSummary> {
        refresh::refresh(self).await
    }

    /// Rebuild the index from scratch, replacing the persisted artifact.
    pub async fn rebuild(&self) -> KnowledgeResult<RefreshSummary> {
        refresh::rebuild(self).await
    }

    /// Snapshot counts for the currently loaded index.
    pub async fn status(&self) -> EngineStatus {
        let snapshot = self.snapshot().await;
        EngineStatus {
            documents: snapshot.document_count(),
            entries: snapshot.entry_count(),
            embedder: snapshot.embedder.clone(),
            dimension: snapshot.dimension,
        }
    }

    pub(crate) async fn snapshot(&self) -> Arc<Index> {
        self.current.read().await.clone()
    }

    pub(crate) fn store(&self) -> &IndexStore {
        &self.store
    }

    pub(crate) fn documents_root(&self) -> &PathBuf {
        &self.documents_root
    }

    pub(crate) fn index_path(&self) -> &PathBuf {
        &self.index_path
    }

    pub(crate) async fn swap(&self, next: Index) {
        *self.current.write().await = Arc::new(next);
    }

    pub(crate) fn writer(&self) -> &Mutex<()> {
        &self.writer
    }
}
