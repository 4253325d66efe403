//! Retrieval capability: an embedding-backed knowledge base used for the
//! PDF fallback extraction during summarization and the per-field metadata
//! lookups during transformation.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::config::EmbeddingConfig;
use crate::fetch::DocumentFetcher;

/// Content-derived identifier for an indexed document: hex MD5 of its URL.
pub fn content_id(url: &str) -> String {
    format!("{:x}", Md5::digest(url.as_bytes()))
}

/// Capability surface the pipeline needs from the retrieval store. An empty
/// store answers `retrieve_*` with an empty string; a failing lookup is an
/// `Err` the caller must record on the affected article.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Split, embed and store a document.
    async fn index(&self, content: &str, source: &str, doc_id: &str) -> Result<()>;

    /// Nearest-passage lookup, best first.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<String>>;

    /// Download a PDF, extract its text, index it and hand the text back.
    async fn extract_pdf(&self, pdf_url: &str, doc_id: &str) -> Result<String>;

    async fn retrieve_abstract(&self) -> Result<String> {
        self.top_passage("abstract").await
    }

    async fn retrieve_authors(&self) -> Result<String> {
        self.top_passage("authors").await
    }

    async fn retrieve_link(&self) -> Result<String> {
        self.top_passage("link").await
    }

    async fn top_passage(&self, field: &str) -> Result<String> {
        let results = self
            .query(field, 1)
            .await
            .with_context(|| format!("knowledge-base lookup for '{}' failed", field))?;
        Ok(results.into_iter().next().unwrap_or_default())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Client for an Ollama-compatible embeddings endpoint.
pub struct EmbeddingClient {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl EmbeddingClient {
    pub fn new(config: EmbeddingConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/api/embeddings",
            self.config.api_base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                prompt: text,
            })
            .send()
            .await
            .context("embedding request failed")?
            .error_for_status()
            .context("embedding request rejected")?;

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("embedding response unreadable")?;
        if parsed.embedding.is_empty() {
            return Err(anyhow!("embedding backend returned an empty vector"));
        }
        Ok(parsed.embedding)
    }
}

struct IndexedChunk {
    text: String,
    vector: Vec<f32>,
    #[allow(dead_code)]
    source: String,
    #[allow(dead_code)]
    doc_id: String,
}

/// In-memory cosine-similarity store over embedded chunks. Summarization
/// worker tasks index into it concurrently; the lock serializes writers
/// against later stage-thread queries.
pub struct VectorKnowledgeBase {
    embeddings: EmbeddingClient,
    fetcher: Arc<dyn DocumentFetcher>,
    chunks: RwLock<Vec<IndexedChunk>>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl VectorKnowledgeBase {
    pub fn new(config: EmbeddingConfig, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        let chunk_size = config.chunk_size.max(1);
        let chunk_overlap = config.chunk_overlap.min(chunk_size.saturating_sub(1));
        Self {
            embeddings: EmbeddingClient::new(config),
            fetcher,
            chunks: RwLock::new(Vec::new()),
            chunk_size,
            chunk_overlap,
        }
    }
}

#[async_trait]
impl KnowledgeBase for VectorKnowledgeBase {
    async fn index(&self, content: &str, source: &str, doc_id: &str) -> Result<()> {
        let pieces = chunk_text(content, self.chunk_size, self.chunk_overlap);
        let mut indexed = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let vector = self.embeddings.embed(&piece).await?;
            indexed.push(IndexedChunk {
                text: piece,
                vector,
                source: source.to_string(),
                doc_id: doc_id.to_string(),
            });
        }

        let count = indexed.len();
        self.chunks.write().await.extend(indexed);
        println!("📚 Indexed {} chunks from {}", count, source);
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<String>> {
        let chunks = self.chunks.read().await;
        if chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embeddings.embed(text).await?;

        let mut scored: Vec<(f32, &IndexedChunk)> = chunks
            .iter()
            .map(|chunk| (cosine_similarity(&query_vector, &chunk.vector), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, chunk)| chunk.text.clone())
            .collect())
    }

    async fn extract_pdf(&self, pdf_url: &str, doc_id: &str) -> Result<String> {
        let bytes = self
            .fetcher
            .get_bytes(pdf_url)
            .await
            .context(format!("failed to download PDF {}", pdf_url))?;

        let content = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| anyhow!("failed to extract text from PDF {}: {}", pdf_url, e))?;
        if content.trim().is_empty() {
            return Err(anyhow!("PDF {} yielded no extractable text", pdf_url));
        }

        self.index(&content, pdf_url, doc_id).await?;
        Ok(content)
    }
}

/// Split text into overlapping character chunks.
fn chunk_text(content: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = content.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        if !piece.trim().is_empty() {
            chunks.push(piece);
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_is_stable() {
        let a = content_id("https://arxiv.org/pdf/2401.00001.pdf");
        let b = content_id("https://arxiv.org/pdf/2401.00001.pdf");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, content_id("https://arxiv.org/pdf/2401.00002.pdf"));
    }

    #[test]
    fn test_chunk_text_overlap() {
        let content = "abcdefghij";
        let chunks = chunk_text(content, 4, 2);
        assert_eq!(chunks[0], "abcd");
        assert_eq!(chunks[1], "cdef");
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_chunk_text_short_input() {
        let chunks = chunk_text("short", 2000, 200);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn test_chunk_text_empty_input() {
        assert!(chunk_text("", 2000, 200).is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
