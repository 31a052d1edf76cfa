//! Embedding backends.
//!
//! The engine is polymorphic over [`Embedder`]: anything that deterministically
//! maps a string to a fixed-length vector. Each backend carries a `signature`
//! identifying the embedding function and version; the signature is pinned
//! into the persisted index, and a mismatch on load forces a rebuild because
//! vectors from different embedders are not comparable.

use std::time::Duration;

use async_trait::async_trait;
use librarian_core::KnowledgeSettings;
use serde::Deserialize;
use tracing::warn;

use crate::errors::{KnowledgeError, KnowledgeResult};

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier of the embedding function and its version.
    fn signature(&self) -> &str;

    /// Embed a batch of passages. All returned vectors share one length.
    async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>>;

    /// Embed a single passage (queries).
    async fn embed_one(&self, input: &str) -> KnowledgeResult<Vec<f32>> {
        let mut vectors = self.embed_batch(&[input.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| KnowledgeError::Embedding("backend returned no vector".to_string()))
    }
}

/// HTTP embedding backend speaking the Ollama `/api/embed` protocol.
///
/// Transport failures and non-success responses are retried with linear
/// backoff up to the configured bound before surfacing as `Embedding`.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    base_url: String,
    model: String,
    signature: String,
    retries: usize,
    client: reqwest::Client,
}

impl HttpEmbedder {
    pub fn new(settings: &KnowledgeSettings) -> KnowledgeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.embedding_timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.embedding_url.trim_end_matches('/').to_string(),
            model: settings.embedding_model.clone(),
            signature: format!("ollama:{}", settings.embedding_model),
            retries: settings.embedding_retries,
            client,
        })
    }

    async fn request(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = EmbedRequest {
            model: self.model.clone(),
            input: inputs.to_vec(),
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KnowledgeError::Embedding(format!(
                "embedding request failed: {status} {text}"
            )));
        }

        let payload: EmbedResponse = response.json().await?;

        if let Some(embeddings) = payload.embeddings {
            return Ok(embeddings);
        }

        if let Some(embedding) = payload.embedding {
            return Ok(vec![embedding]);
        }

        Err(KnowledgeError::Embedding(
            "embedding response missing vectors".to_string(),
        ))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn signature(&self) -> &str {
        &self.signature
    }

    async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let mut last_error = None;
        for attempt in 0..=self.retries {
            match self.request(inputs).await {
                Ok(vectors) => {
                    if vectors.len() != inputs.len() {
                        return Err(KnowledgeError::Embedding(format!(
                            "backend returned {} vectors for {} inputs",
                            vectors.len(),
                            inputs.len()
                        )));
                    }
                    return Ok(vectors);
                }
                Err(err) => {
                    warn!(attempt, retries = self.retries, "embedding batch failed: {err}");
                    last_error = Some(err);
                    if attempt < self.retries {
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1)))
                            .await;
                    }
                }
            }
        }

        Err(match last_error {
            Some(KnowledgeError::Embedding(msg)) => KnowledgeError::Embedding(msg),
            Some(err) => KnowledgeError::Embedding(err.to_string()),
            None => KnowledgeError::Embedding("embedding failed".to_string()),
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedResponse {
    embeddings: Option<Vec<Vec<f32>>>,
    embedding: Option<Vec<f32>>,
}

/// Deterministic offline backend: hashed bag-of-words, L2-normalized.
///
/// No model weights and no network, so it is always available. Retrieval
/// quality is lexical rather than semantic, which is enough for tests and
/// for air-gapped fallback operation.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    signature: String,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self::with_dimension(384)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            signature: format!("hash-bow:v1:{dimension}"),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_text(&self, input: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in input
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn signature(&self) -> &str {
        &self.signature
    }

    async fn embed_batch(&self, inputs: &[String]) -> KnowledgeResult<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|text| self.embed_text(text)).collect())
    }
}

// FNV-1a: stable across platforms and releases, unlike std's DefaultHasher.
fn fnv1a(input: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in input.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
