//! Exhaustive cosine similarity search over a loaded index.
//!
//! Exact top-k under full scan is the reference semantics; an approximate
//! nearest-neighbor structure could replace this for large indices, but it
//! would have to approximate exactly these results.

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::SearchHit;
use crate::store::Index;

/// Cosine similarity between two vectors of equal length.
///
/// Zero vectors score 0.0 against everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Return the top `k` entries ranked by cosine similarity, descending.
///
/// Ties keep original insertion order (stable sort), so results are
/// deterministic. An empty index yields an empty result, not an error.
pub fn search(index: &Index, query: &[f32], k: usize) -> KnowledgeResult<Vec<SearchHit>> {
    if k == 0 {
        return Err(KnowledgeError::InvalidArgument(
            "k must be at least 1".to_string(),
        ));
    }

    if index.entries.is_empty() {
        return Ok(Vec::new());
    }

    if query.len() != index.dimension {
        return Err(KnowledgeError::EmbeddingDimMismatch {
            expected: index.dimension,
            actual: query.len(),
        });
    }

    let mut scored: Vec<(usize, f32)> = index
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
        .collect();

    // Stable sort: equal scores keep insertion order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);

    Ok(scored
        .into_iter()
        .map(|(i, score)| {
            let entry = &index.entries[i];
            SearchHit {
                text: entry.text.clone(),
                source: entry.path.clone(),
                score,
            }
        })
        .collect())
}
