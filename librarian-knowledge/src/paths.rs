use std::path::PathBuf;

use librarian_core::KnowledgeSettings;

use crate::errors::{KnowledgeError, KnowledgeResult};

pub const DOCUMENTS_DIR: &str = "documents";
pub const INDEX_FILE: &str = "index.json";

pub fn data_root(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.data_root_override {
        return Ok(path.clone());
    }

    if let Ok(override_dir) = std::env::var("LIBRARIAN_DATA_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let dir = dirs::data_dir().ok_or(KnowledgeError::MissingDataDir)?;
    Ok(dir.join("librarian"))
}

pub fn documents_root(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.documents_root_override {
        return Ok(path.clone());
    }
    Ok(data_root(settings)?.join(DOCUMENTS_DIR))
}

pub fn index_path(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.index_path_override {
        return Ok(path.clone());
    }
    Ok(data_root(settings)?.join(INDEX_FILE))
}
