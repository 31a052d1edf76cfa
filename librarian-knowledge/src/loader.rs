//! Document loader: reads one supported file into a normalized text stream.
//!
//! PDF text comes from `pdf-extract`, DOCX text from the `word/document.xml`
//! part of the OOXML archive. Embedded images and tables are ignored; only
//! running text is extracted.

use std::io::Read;
use std::path::Path;

use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::Reader;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{Document, DocumentFormat};

/// Load a single document from disk.
///
/// Fails with `UnsupportedFormat` for unknown extensions and `DocumentRead`
/// for anything wrong with the file itself (missing, oversize, corrupt,
/// unextractable). Neither aborts a batch ingestion of other documents.
pub async fn load(path: &Path, max_bytes: u64) -> KnowledgeResult<Document> {
    let format = DocumentFormat::from_path(path)
        .ok_or_else(|| KnowledgeError::UnsupportedFormat(path.to_path_buf()))?;

    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| read_error(path, e.to_string()))?;
    if !meta.is_file() {
        return Err(read_error(path, "not a regular file"));
    }
    if meta.len() > max_bytes {
        return Err(read_error(
            path,
            format!("file too large: {} bytes (cap {})", meta.len(), max_bytes),
        ));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| read_error(path, e.to_string()))?;
    let checksum = compute_checksum(&bytes);

    let text = match format {
        DocumentFormat::PlainText => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentFormat::Pdf => extract_blocking(path, bytes, extract_pdf_text).await?,
        DocumentFormat::Docx => extract_blocking(path, bytes, extract_docx_text).await?,
    };

    debug!(path = %path.display(), format = %format, chars = text.chars().count(), "loaded document");

    Ok(Document {
        path: path.to_path_buf(),
        format,
        text,
        checksum,
        loaded_at: Utc::now(),
    })
}

/// Hex sha256 over raw file bytes.
pub fn compute_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn read_error(path: &Path, reason: impl Into<String>) -> KnowledgeError {
    KnowledgeError::DocumentRead {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

/// Run a CPU-bound extractor off the async runtime.
async fn extract_blocking(
    path: &Path,
    bytes: Vec<u8>,
    extract: fn(&[u8]) -> Result<String, String>,
) -> KnowledgeResult<String> {
    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract(&bytes))
        .await
        .map_err(|e| read_error(&owned, format!("extraction task failed: {e}")))?
        .map_err(|reason| read_error(&owned, reason))
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| format!("pdf extraction failed: {e}"))
}

/// Pull paragraph text out of the OOXML main document part.
///
/// Walks `word/document.xml` with a streaming XML reader, collecting `w:t`
/// runs in document order and terminating each `w:p` with a newline.
fn extract_docx_text(bytes: &[u8]) -> Result<String, String> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive =
        zip::ZipArchive::new(cursor).map_err(|e| format!("not a docx archive: {e}"))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing word/document.xml: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable document part: {e}"))?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_run = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run = false,
                b"w:p" => {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_run => {
                let run = t
                    .unescape()
                    .map_err(|e| format!("malformed document text: {e}"))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("malformed document.xml: {e}")),
        }
    }

    Ok(text)
}
