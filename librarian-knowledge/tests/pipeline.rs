//! End-to-end ingestion and query behavior over a temp documents directory,
//! using the offline hash embedder.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use librarian_knowledge::{
    HashEmbedder, KnowledgeEngine, KnowledgeError, KnowledgeSettings,
};

fn test_settings(docs: &Path, data: &Path) -> KnowledgeSettings {
    KnowledgeSettings {
        documents_root_override: Some(docs.to_path_buf()),
        data_root_override: Some(data.to_path_buf()),
        ..Default::default()
    }
}

async fn engine_with_docs(temp: &TempDir, docs: &[(&str, &str)]) -> KnowledgeEngine {
    let docs_dir = temp.path().join("docs");
    std::fs::create_dir_all(&docs_dir).unwrap();
    for (name, content) in docs {
        std::fs::write(docs_dir.join(name), content).unwrap();
    }

    let settings = test_settings(&docs_dir, &temp.path().join("data"));
    KnowledgeEngine::open_with_embedder(settings, Arc::new(HashEmbedder::new()))
        .await
        .expect("open engine")
}

#[tokio::test]
async fn build_then_query_finds_the_relevant_document() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_docs(
        &temp,
        &[
            ("a.txt", "The capital of France is Paris."),
            ("b.txt", "Mount Everest is the tallest mountain."),
        ],
    )
    .await;

    let hits = engine
        .query("What is the capital of France?", 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].source.ends_with("a.txt"));
    assert!(hits[0].text.contains("Paris"));
}

#[tokio::test]
async fn query_matching_a_stored_chunk_ranks_it_first_with_max_score() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_docs(
        &temp,
        &[
            ("a.txt", "The capital of France is Paris."),
            ("b.txt", "Mount Everest is the tallest mountain."),
        ],
    )
    .await;

    let hits = engine
        .query("The capital of France is Paris.", 2)
        .await
        .unwrap();
    assert!(hits[0].source.ends_with("a.txt"));
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn k_larger_than_index_returns_everything_descending() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_docs(
        &temp,
        &[
            ("a.txt", "The capital of France is Paris."),
            ("b.txt", "Mount Everest is the tallest mountain."),
        ],
    )
    .await;

    let hits = engine.query("capital mountain", 5).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn empty_index_yields_empty_results_not_an_error() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_docs(&temp, &[]).await;

    let hits = engine.query("anything at all", 3).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn zero_k_is_an_invalid_argument() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_docs(&temp, &[("a.txt", "The capital of France is Paris.")]).await;

    let err = engine.query("capital", 0).await.unwrap_err();
    assert!(matches!(err, KnowledgeError::InvalidArgument(_)));
}

#[tokio::test]
async fn status_reports_loaded_index_shape() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_docs(
        &temp,
        &[
            ("a.txt", "The capital of France is Paris."),
            ("b.txt", "Mount Everest is the tallest mountain."),
        ],
    )
    .await;

    let status = engine.status().await;
    assert_eq!(status.documents, 2);
    assert_eq!(status.entries, 2);
    assert_eq!(status.embedder, "hash-bow:v1:384");
    assert_eq!(status.dimension, 384);
}

#[tokio::test]
async fn persisted_index_is_reused_across_openings() {
    let temp = TempDir::new().unwrap();
    let engine = engine_with_docs(&temp, &[("a.txt", "The capital of France is Paris.")]).await;
    drop(engine);

    let index_file = temp.path().join("data").join("index.json");
    assert!(index_file.exists());
    let before = std::fs::read(&index_file).unwrap();

    // Reopen: load path, no rebuild, so the artifact is untouched.
    let settings = test_settings(&temp.path().join("docs"), &temp.path().join("data"));
    let engine = KnowledgeEngine::open_with_embedder(settings, Arc::new(HashEmbedder::new()))
        .await
        .unwrap();
    let after = std::fs::read(&index_file).unwrap();
    assert_eq!(before, after);

    let hits = engine.query("capital of France", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
}
