//! Knowledge-base indexing and semantic-search engine.
//!
//! Ingestion: loader → chunker → embedder → index store. Query:
//! embedder(query) → similarity search → ranked passages. External callers
//! go through [`KnowledgeEngine`].

pub mod chunker;
pub mod embedder;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod models;
pub mod paths;
pub mod search;
pub mod store;

pub use librarian_core::{ChunkPolicy, KnowledgeSettings, SearchDefaults};

pub use embedder::{Embedder, HashEmbedder, HttpEmbedder};
pub use engine::KnowledgeEngine;
pub use errors::{KnowledgeError, KnowledgeResult};
pub use models::{
    Document, DocumentFailure, DocumentFormat, EngineStatus, IndexEntry, RefreshSummary,
    SearchHit,
};
pub use store::{Index, IndexStore};
