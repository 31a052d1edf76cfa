//! Incremental update semantics: idempotence, change tracking, and local
//! failure recovery during refresh.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use librarian_knowledge::{HashEmbedder, KnowledgeEngine, KnowledgeSettings};

struct Fixture {
    engine: KnowledgeEngine,
    docs_dir: PathBuf,
    index_file: PathBuf,
    _temp: TempDir,
}

impl Fixture {
    async fn setup(docs: &[(&str, &str)]) -> Self {
        let temp = TempDir::new().unwrap();
        let docs_dir = temp.path().join("docs");
        let data_dir = temp.path().join("data");
        std::fs::create_dir_all(&docs_dir).unwrap();
        for (name, content) in docs {
            std::fs::write(docs_dir.join(name), content).unwrap();
        }

        let settings = KnowledgeSettings {
            documents_root_override: Some(docs_dir.clone()),
            data_root_override: Some(data_dir.clone()),
            ..Default::default()
        };
        let engine =
            KnowledgeEngine::open_with_embedder(settings, Arc::new(HashEmbedder::new()))
                .await
                .expect("open engine");

        Self {
            engine,
            docs_dir,
            index_file: data_dir.join("index.json"),
            _temp: temp,
        }
    }

    fn write_doc(&self, name: &str, content: &str) {
        std::fs::write(self.docs_dir.join(name), content).unwrap();
    }

    fn remove_doc(&self, name: &str) {
        std::fs::remove_file(self.docs_dir.join(name)).unwrap();
    }

    fn index_bytes(&self) -> Vec<u8> {
        std::fs::read(&self.index_file).unwrap()
    }
}

fn source_name(path: &Path) -> &str {
    path.file_name().unwrap().to_str().unwrap()
}

#[tokio::test]
async fn refreshing_an_unchanged_directory_is_byte_identical() {
    let fixture = Fixture::setup(&[
        ("a.txt", "The capital of France is Paris."),
        ("b.txt", "Mount Everest is the tallest mountain."),
    ])
    .await;

    let before = fixture.index_bytes();
    let summary = fixture.engine.refresh().await.unwrap();
    let after = fixture.index_bytes();

    assert_eq!(summary.unchanged, 2);
    assert!(summary.added.is_empty());
    assert!(summary.changed.is_empty());
    assert!(summary.removed.is_empty());
    assert_eq!(before, after);
}

#[tokio::test]
async fn update_touches_exactly_the_modified_and_deleted_documents() {
    let fixture = Fixture::setup(&[
        ("a.txt", "The capital of France is Paris."),
        ("b.txt", "Mount Everest is the tallest mountain."),
        ("c.txt", "The Nile is the longest river in Africa."),
    ])
    .await;

    // Fixed query pinned to the untouched document.
    let baseline = fixture
        .engine
        .query("longest river in Africa", 1)
        .await
        .unwrap();
    assert!(baseline[0].source.ends_with("c.txt"));

    fixture.write_doc("a.txt", "The capital of Italy is Rome.");
    fixture.remove_doc("b.txt");

    let summary = fixture.engine.refresh().await.unwrap();
    assert_eq!(
        summary.changed.iter().map(|p| source_name(p)).collect::<Vec<_>>(),
        vec!["a.txt"]
    );
    assert_eq!(
        summary.removed.iter().map(|p| source_name(p)).collect::<Vec<_>>(),
        vec!["b.txt"]
    );
    assert!(summary.added.is_empty());
    assert_eq!(summary.unchanged, 1);

    // The untouched document's text and score are unchanged.
    let hits = fixture
        .engine
        .query("longest river in Africa", 1)
        .await
        .unwrap();
    assert_eq!(hits[0].text, baseline[0].text);
    assert_eq!(hits[0].score, baseline[0].score);

    // Modified content is searchable; deleted content is gone.
    let rome = fixture.engine.query("capital of Italy Rome", 1).await.unwrap();
    assert!(rome[0].source.ends_with("a.txt"));
    let status = fixture.engine.status().await;
    assert_eq!(status.documents, 2);
}

#[tokio::test]
async fn added_documents_become_searchable_after_refresh() {
    let fixture = Fixture::setup(&[("a.txt", "The capital of France is Paris.")]).await;

    fixture.write_doc("d.txt", "Photosynthesis converts sunlight into energy.");
    let summary = fixture.engine.refresh().await.unwrap();
    assert_eq!(
        summary.added.iter().map(|p| source_name(p)).collect::<Vec<_>>(),
        vec!["d.txt"]
    );

    let hits = fixture
        .engine
        .query("photosynthesis sunlight energy", 1)
        .await
        .unwrap();
    assert!(hits[0].source.ends_with("d.txt"));
}

#[tokio::test]
async fn unreadable_document_is_reported_without_failing_the_refresh() {
    let fixture = Fixture::setup(&[("a.txt", "The capital of France is Paris.")]).await;

    // A .docx that is not an OOXML archive.
    fixture.write_doc("broken.docx", "definitely not a zip file");

    let summary = fixture.engine.refresh().await.unwrap();
    assert_eq!(summary.failures.len(), 1);
    assert!(summary.failures[0].path.ends_with("broken.docx"));
    assert!(!summary.failures[0].reason.is_empty());

    // Engine stays Ready and queries still work.
    let hits = fixture.engine.query("capital of France", 1).await.unwrap();
    assert_eq!(hits.len(), 1);
}
