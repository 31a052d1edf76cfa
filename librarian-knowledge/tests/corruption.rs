//! Corrupt or missing persisted indexes must be survivable: load reports
//! `IndexCorrupt` and the facade transparently rebuilds.

use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use librarian_knowledge::{
    store, HashEmbedder, KnowledgeEngine, KnowledgeError, KnowledgeSettings,
};

fn test_settings(docs: &Path, data: &Path) -> KnowledgeSettings {
    KnowledgeSettings {
        documents_root_override: Some(docs.to_path_buf()),
        data_root_override: Some(data.to_path_buf()),
        ..Default::default()
    }
}

#[tokio::test]
async fn truncated_index_file_fails_load_with_index_corrupt() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let data = temp.path().join("data");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("a.txt"), "The capital of France is Paris.").unwrap();

    let settings = test_settings(&docs, &data);
    let engine = KnowledgeEngine::open_with_embedder(settings, Arc::new(HashEmbedder::new()))
        .await
        .unwrap();
    drop(engine);

    let index_file = data.join("index.json");
    let bytes = std::fs::read(&index_file).unwrap();
    std::fs::write(&index_file, &bytes[..bytes.len() / 3]).unwrap();

    let err = store::load(&index_file).unwrap_err();
    assert!(matches!(err, KnowledgeError::IndexCorrupt(_)));
}

#[tokio::test]
async fn facade_falls_back_to_build_on_corrupt_index() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let data = temp.path().join("data");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("a.txt"), "The capital of France is Paris.").unwrap();
    std::fs::write(docs.join("b.txt"), "Mount Everest is the tallest mountain.").unwrap();

    let settings = test_settings(&docs, &data);
    let engine =
        KnowledgeEngine::open_with_embedder(settings.clone(), Arc::new(HashEmbedder::new()))
            .await
            .unwrap();
    drop(engine);

    let index_file = data.join("index.json");
    let bytes = std::fs::read(&index_file).unwrap();
    std::fs::write(&index_file, &bytes[..bytes.len() / 2]).unwrap();

    // Reopen: corrupt artifact detected, rebuilt from the documents dir.
    let engine = KnowledgeEngine::open_with_embedder(settings, Arc::new(HashEmbedder::new()))
        .await
        .expect("open must survive a corrupt index");

    let hits = engine
        .query("What is the capital of France?", 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].source.ends_with("a.txt"));

    // The rebuilt artifact is valid again.
    assert!(store::load(&index_file).is_ok());
}

#[tokio::test]
async fn facade_rebuilds_when_the_index_was_built_by_another_embedder() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let data = temp.path().join("data");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("a.txt"), "The capital of France is Paris.").unwrap();

    let settings = test_settings(&docs, &data);
    let engine = KnowledgeEngine::open_with_embedder(
        settings.clone(),
        Arc::new(HashEmbedder::with_dimension(128)),
    )
    .await
    .unwrap();
    drop(engine);

    // Same artifact, different embedding function: must rebuild, not mix.
    let engine = KnowledgeEngine::open_with_embedder(
        settings,
        Arc::new(HashEmbedder::with_dimension(384)),
    )
    .await
    .unwrap();

    let status = engine.status().await;
    assert_eq!(status.embedder, "hash-bow:v1:384");
    assert_eq!(status.dimension, 384);
}

#[tokio::test]
async fn missing_index_file_triggers_a_clean_build() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("docs");
    let data = temp.path().join("data");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("a.txt"), "The capital of France is Paris.").unwrap();

    let settings = test_settings(&docs, &data);
    let engine = KnowledgeEngine::open_with_embedder(settings, Arc::new(HashEmbedder::new()))
        .await
        .unwrap();

    assert!(data.join("index.json").exists());
    let hits = engine.query("capital of France", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
}
