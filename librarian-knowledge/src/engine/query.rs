use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::SearchHit;
use crate::search;

use super::KnowledgeEngine;

pub(crate) async fn query(
    engine: &KnowledgeEngine,
    text: &str,
    k: usize,
) -> KnowledgeResult<Vec<SearchHit>> {
    if k == 0 {
        return Err(KnowledgeError::InvalidArgument(
            "k must be at least 1".to_string(),
        ));
    }

    let snapshot = engine.snapshot().await;
    if snapshot.entries.is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = engine.store().embedder().embed_one(text).await?;
    search::search(&snapshot, &query_vector, k)
}
