use tracing::info;

use crate::errors::KnowledgeResult;
use crate::models::RefreshSummary;
use crate::store;

use super::KnowledgeEngine;

/// Incremental reconcile: diff the documents directory against the current
/// snapshot, persist the result, then swap it in.
///
/// The delta is built against a cloned snapshot while queries keep reading
/// the old one; any failure before the swap leaves the prior index intact.
pub(crate) async fn refresh(engine: &KnowledgeEngine) -> KnowledgeResult<RefreshSummary> {
    let _guard = engine.writer().lock().await;

    let snapshot = engine.snapshot().await;
    let (next, summary) = engine
        .store()
        .update(engine.documents_root(), &snapshot)
        .await?;
    store::save(&next, engine.index_path())?;
    engine.swap(next).await;

    info!(
        added = summary.added.len(),
        removed = summary.removed.len(),
        "refresh complete"
    );
    Ok(summary)
}

/// Full rebuild: re-chunk and re-embed everything, replacing the persisted
/// index wholesale. Used when the embedder changes or corruption is found.
pub(crate) async fn rebuild(engine: &KnowledgeEngine) -> KnowledgeResult<RefreshSummary> {
    let _guard = engine.writer().lock().await;

    let (next, summary) = engine.store().build(engine.documents_root()).await?;
    store::save(&next, engine.index_path())?;
    engine.swap(next).await;

    info!(documents = summary.added.len(), "rebuild complete");
    Ok(summary)
}
